use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn stemmux() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stemmux"));
    for var in [
        "STEMMUX_WORK_DIR",
        "STEMMUX_DOWNLOADS_DIR",
        "STEMMUX_SEPARATED_DIR",
        "STEMMUX_MIXES_DIR",
        "STEMMUX_REMUXED_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_tone(path: &Path, frequency: f32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for frame in 0..4_410 {
        let t = frame as f32 / 44_100.0;
        let value = (0.4 * (std::f32::consts::TAU * frequency * t).sin() * 32_767.0) as i16;
        writer.write_sample(value).expect("left");
        writer.write_sample(value).expect("right");
    }
    writer.finalize().expect("finalize wav");
}

#[test]
fn layout_prints_named_and_synthesized_layouts() {
    stemmux()
        .args(["layout", "3"])
        .assert()
        .success()
        .stdout("3.0\n");
    stemmux()
        .args(["layout", "2"])
        .assert()
        .success()
        .stdout("stereo\n");
    stemmux()
        .args(["layout", "8"])
        .assert()
        .success()
        .stdout("8.0\n");
}

#[test]
fn layout_rejects_non_numeric_counts() {
    stemmux().args(["layout", "many"]).assert().failure();
}

#[test]
fn discover_prints_channel_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["other.wav", "bass.wav", "vocals.wav", "zither.wav", "multichannel_stems.wav"] {
        std::fs::write(dir.path().join(name), b"").expect("touch");
    }

    stemmux()
        .arg("discover")
        .arg(dir.path())
        .assert()
        .success()
        .stdout("vocals\nbass\nother\nzither\n");
}

#[test]
fn discover_of_missing_dir_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    stemmux()
        .arg("discover")
        .arg(dir.path().join("missing"))
        .assert()
        .failure();
}

#[test]
fn merge_assembles_stems() {
    let work = tempfile::tempdir().expect("tempdir");
    let stems = work.path().join("stems");
    std::fs::create_dir_all(&stems).expect("mkdir");
    write_tone(&stems.join("vocals.wav"), 440.0);
    write_tone(&stems.join("other.wav"), 660.0);
    write_tone(&stems.join("bass.wav"), 55.0);

    stemmux()
        .arg("merge")
        .arg(&stems)
        .arg("--work-dir")
        .arg(work.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"completed\""))
        .stdout(predicate::str::contains("\"channel_layout\": \"3.0\""));

    assert!(stems.join("multichannel_stems.wav").is_file());
    assert!(stems.join("stem_index.json").is_file());
}

#[test]
fn quiet_silences_progress_logging() {
    let work = tempfile::tempdir().expect("tempdir");
    let stems = work.path().join("stems");
    std::fs::create_dir_all(&stems).expect("mkdir");
    write_tone(&stems.join("vocals.wav"), 440.0);
    write_tone(&stems.join("bass.wav"), 55.0);

    stemmux()
        .arg("--work-dir")
        .arg(work.path())
        .arg("merge")
        .arg(&stems)
        .assert()
        .success()
        .stderr(predicate::str::contains("submitted"));

    stemmux()
        .arg("--work-dir")
        .arg(work.path())
        .arg("--quiet")
        .arg("merge")
        .arg(&stems)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn merge_of_empty_dir_reports_failure() {
    let work = tempfile::tempdir().expect("tempdir");
    let stems = work.path().join("empty");
    std::fs::create_dir_all(&stems).expect("mkdir");

    stemmux()
        .arg("merge")
        .arg(&stems)
        .arg("--work-dir")
        .arg(work.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"state\": \"failed\""))
        .stdout(predicate::str::contains("merge failed: not found"));
}

#[test]
fn merge_names_silent_stems() {
    let work = tempfile::tempdir().expect("tempdir");
    let stems = work.path().join("stems");
    std::fs::create_dir_all(&stems).expect("mkdir");
    write_tone(&stems.join("vocals.wav"), 440.0);
    write_tone(&stems.join("drums.wav"), 0.0);

    stemmux()
        .arg("merge")
        .arg(&stems)
        .arg("--work-dir")
        .arg(work.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("appear silent"))
        .stdout(predicate::str::contains("drums"));
}

#[test]
fn mix_rejects_negative_gains() {
    let work = tempfile::tempdir().expect("tempdir");
    stemmux()
        .args(["mix", "stems", "--video", "in.mp4", "--out", "out.mp4", "--gain", "bass=-1"])
        .arg("--work-dir")
        .arg(work.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn list_remuxed_on_fresh_work_dir_is_empty() {
    let work = tempfile::tempdir().expect("tempdir");
    stemmux()
        .arg("list-remuxed")
        .arg("--work-dir")
        .arg(work.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"files\": []"));
}

use std::path::Path;

use log::info;

use super::{CommandRunner, Invocation};
use crate::error::{Result, StemError};

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StemError::NotFound(format!("{}", path.display())))
    }
}

fn base_invocation(ffmpeg: &str, video: &Path, audio: &Path) -> Invocation {
    Invocation::new("ffmpeg", ffmpeg)
        .args(["-y", "-i"])
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac"])
}

/// Replace the audio of `video` with the assembled multichannel stream.
pub fn remux_multichannel(
    runner: &dyn CommandRunner,
    ffmpeg: &str,
    video: &Path,
    multichannel: &Path,
    layout_name: &str,
    output: &Path,
) -> Result<()> {
    require_file(video)?;
    require_file(multichannel)?;

    let invocation = base_invocation(ffmpeg, video, multichannel)
        .args(["-b:a", "384k", "-movflags", "use_metadata_tags", "-metadata:s:a:0"])
        .arg(format!("title=Stem mix ({})", layout_name))
        .arg(output);
    runner.run(&invocation)?;

    info!("remuxed {} ({}) into {}", video.display(), layout_name, output.display());
    Ok(())
}

/// Replace the audio of `video` with a rendered mixdown.
pub fn remux_mix(runner: &dyn CommandRunner, ffmpeg: &str, video: &Path, mix: &Path, output: &Path) -> Result<()> {
    require_file(video)?;

    let invocation = base_invocation(ffmpeg, video, mix).arg(output);
    runner.run(&invocation)?;

    info!("exported mix {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingRunner;
    use crate::tools::ToolOutput;

    #[test]
    fn multichannel_remux_titles_the_audio_track() {
        let dir = tempfile::tempdir().expect("tempdir");
        let video = dir.path().join("clip.mp4");
        let audio = dir.path().join("multichannel_stems.wav");
        std::fs::write(&video, b"v").expect("write");
        std::fs::write(&audio, b"a").expect("write");
        let output = dir.path().join("clip_remuxed.mp4");

        let runner = RecordingRunner::new(|_| Ok(ToolOutput::default()));
        remux_multichannel(&runner, "ffmpeg", &video, &audio, "3.0", &output).expect("remux");

        let args = runner.calls()[0].args_lossy();
        let expected: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            video.display().to_string(),
            "-i".into(),
            audio.display().to_string(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            "384k".into(),
            "-movflags".into(),
            "use_metadata_tags".into(),
            "-metadata:s:a:0".into(),
            "title=Stem mix (3.0)".into(),
            output.display().to_string(),
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn missing_video_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = RecordingRunner::new(|_| Ok(ToolOutput::default()));
        let err = remux_mix(
            &runner,
            "ffmpeg",
            &dir.path().join("absent.mp4"),
            &dir.path().join("mix.wav"),
            &dir.path().join("out.mp4"),
        )
        .err()
        .expect("should fail");
        assert!(matches!(err, StemError::NotFound(_)));
        assert!(runner.calls().is_empty());
    }
}

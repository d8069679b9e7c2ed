use std::path::{Path, PathBuf};

use log::info;

use super::{CommandRunner, Invocation};
use crate::config::PipelineConfig;
use crate::error::{Result, StemError};

const FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

fn download_invocation(config: &PipelineConfig, url: &str) -> Invocation {
    let template = config.downloads_dir.join("%(title)s.%(ext)s");
    Invocation::new("yt-dlp", &config.ytdlp)
        .args(["-f", FORMAT_SELECTOR, "--merge-output-format", "mp4", "-o"])
        .arg(template)
        .args(["--newline", "--print", "after_move:filepath"])
        .arg(url)
}

/// Download `url` into the downloads directory and return the video path.
pub fn download_video(runner: &dyn CommandRunner, config: &PipelineConfig, url: &str) -> Result<PathBuf> {
    let url = url.trim();
    if url.is_empty() {
        return Err(StemError::InvalidInput("download URL is empty".to_string()));
    }
    std::fs::create_dir_all(&config.downloads_dir)?;

    let output = runner.run(&download_invocation(config, url))?;
    let path = output
        .stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| StemError::tool("yt-dlp", "no output file was reported"))?;

    if !Path::new(&path).is_file() {
        return Err(StemError::NotFound(format!(
            "downloaded file {} does not exist",
            path.display()
        )));
    }
    info!("downloaded {} to {}", url, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingRunner;
    use crate::tools::ToolOutput;

    #[test]
    fn reports_the_last_printed_path() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig::with_work_dir(root.path());
        let video = config.downloads_dir.join("Song.mp4");
        let printed = video.clone();

        let runner = RecordingRunner::new(move |_| {
            std::fs::write(&printed, b"video").expect("write video");
            Ok(ToolOutput {
                stdout: format!("[download] 100%\n{}\n\n", printed.display()),
                stderr: String::new(),
            })
        });

        let path = download_video(&runner, &config, " https://example.com/watch?v=1 ").expect("download");
        assert_eq!(path, video);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let args = calls[0].args_lossy();
        assert_eq!(calls[0].program, "yt-dlp");
        assert_eq!(args[1], FORMAT_SELECTOR);
        assert!(args.contains(&"after_move:filepath".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/watch?v=1"));
    }

    #[test]
    fn empty_url_never_reaches_the_tool() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig::with_work_dir(root.path());
        let runner = RecordingRunner::new(|_| Ok(ToolOutput::default()));

        let err = download_video(&runner, &config, "  ").err().expect("should fail");
        assert!(matches!(err, StemError::InvalidInput(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn silent_download_is_a_tool_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig::with_work_dir(root.path());
        let runner = RecordingRunner::new(|_| Ok(ToolOutput::default()));

        let err = download_video(&runner, &config, "https://example.com/v")
            .err()
            .expect("should fail");
        assert!(matches!(err, StemError::ExternalTool { .. }));
    }
}

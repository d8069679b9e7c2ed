use std::path::PathBuf;
use std::time::Duration;

use clap::ArgMatches;
use log::{error, info};
use serde_json::json;
use stemmux_lib::jobs::{JobState, JobStatus};
use stemmux_lib::layout::resolve_layout;
use stemmux_lib::pipeline::StemService;
use stemmux_lib::stems::discover_stems;
use stemmux_lib::{PipelineConfig, Result, StemError};

use crate::cli;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: &ArgMatches) -> Result<i32> {
    match args.subcommand() {
        Some(("layout", sub)) => {
            let count = *sub
                .get_one::<usize>("COUNT")
                .ok_or_else(|| StemError::InvalidInput("missing stem count".to_string()))?;
            println!("{}", resolve_layout(count).name());
            Ok(0)
        }
        Some(("discover", sub)) => {
            let set = discover_stems(&path_arg(sub, "DIR")?)?;
            for name in set.names() {
                println!("{}", name);
            }
            Ok(0)
        }
        Some(("merge", sub)) => {
            let service = service(sub)?;
            let id = service.submit_merge(path_arg(sub, "DIR")?)?;
            Ok(follow(&service, &id))
        }
        Some(("remux", sub)) => {
            let service = service(sub)?;
            let id = service.submit_remux(path_arg(sub, "VIDEO")?, path_arg(sub, "DIR")?)?;
            Ok(follow(&service, &id))
        }
        Some(("separate", sub)) => {
            let service = service(sub)?;
            let model = sub.get_one::<String>("model").cloned();
            let id = service.submit_separate(path_arg(sub, "VIDEO")?, model)?;
            Ok(follow(&service, &id))
        }
        Some(("download", sub)) => {
            let service = service(sub)?;
            let url = sub
                .get_one::<String>("URL")
                .ok_or_else(|| StemError::InvalidInput("missing URL".to_string()))?;
            let id = service.submit_download(url.as_str())?;
            Ok(follow(&service, &id))
        }
        Some(("mix", sub)) => {
            let request = cli::mix::request_from_args(sub)?;
            let service = service(sub)?;
            let id = service.submit_mix_export(request)?;
            Ok(follow(&service, &id))
        }
        Some(("list-remuxed", sub)) => {
            let files = service(sub)?.list_remuxed()?;
            print_json(&json!({ "files": files }))?;
            Ok(0)
        }
        Some(("cleanup", sub)) => {
            service(sub)?.cleanup()?;
            print_json(&json!({ "message": "All temporary files and task data cleaned up." }))?;
            Ok(0)
        }
        _ => Err(StemError::InvalidInput("unknown command".to_string())),
    }
}

fn config(args: &ArgMatches) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    if let Some(root) = args.get_one::<String>("work-dir") {
        config.set_work_dir(root);
    }
    config
}

fn service(args: &ArgMatches) -> Result<StemService> {
    StemService::with_defaults(config(args))
}

fn path_arg(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<String>(name)
        .map(PathBuf::from)
        .ok_or_else(|| StemError::InvalidInput(format!("missing {}", name)))
}

/// Poll job `id` until it finishes, logging progress, then print its status.
///
/// Returns 0 when the job completed and 1 otherwise.
fn follow(service: &StemService, id: &str) -> i32 {
    info!("job {} submitted", id);

    let mut last_message = String::new();
    let status = loop {
        let Some(status) = service.status(id) else {
            break None;
        };
        if status.message != last_message {
            info!("[{:>3.0}%] {}", status.progress * 100.0, status.message);
            last_message = status.message.clone();
        }
        if status.state.is_terminal() {
            break Some(status);
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let Some(status) = status else {
        error!("job {} disappeared", id);
        return 1;
    };
    if let Err(err) = print_status(id, &status) {
        error!("{}", err.to_string().to_lowercase());
        return 1;
    }
    if status.state == JobState::Completed {
        0
    } else {
        1
    }
}

fn print_status(id: &str, status: &JobStatus) -> Result<()> {
    let mut value = serde_json::to_value(status)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("id".to_string(), json!(id));
    }
    print_json(&value)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

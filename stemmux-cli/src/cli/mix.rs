//! Turning `mix` arguments into a [`MixRequest`].

use std::path::PathBuf;

use clap::ArgMatches;
use stemmux_lib::mix::{GainMap, MixRequest};
use stemmux_lib::{Result, StemError};

/// Build the gain map from `--gains-json` and any `--gain` overrides.
pub fn gains_from_args(args: &ArgMatches) -> Result<GainMap> {
    let mut gains = match args.get_one::<String>("gains-json") {
        Some(path) => GainMap::from_json_file(&PathBuf::from(path))?,
        None => GainMap::new(),
    };
    if let Some(assignments) = args.get_many::<String>("gain") {
        for assignment in assignments {
            let (stem, gain) = GainMap::parse_assignment(assignment)?;
            gains.set(stem, gain)?;
        }
    }
    Ok(gains)
}

pub fn request_from_args(args: &ArgMatches) -> Result<MixRequest> {
    let required = |name: &str| {
        args.get_one::<String>(name)
            .cloned()
            .ok_or_else(|| StemError::InvalidInput(format!("missing {}", name)))
    };

    Ok(MixRequest {
        stem_dir: PathBuf::from(required("DIR")?),
        video: PathBuf::from(required("VIDEO")?),
        output_name: required("out")?,
        gains: gains_from_args(args)?,
    })
}

//! CLI argument definitions for `stemmux`.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("stemmux")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Adam Howard <adam.thomas.howard@gmail.com>")
        .about("Assemble separated stems into multichannel audio and export gain mixes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("work-dir")
                .long("work-dir")
                .short('w')
                .value_name("DIR")
                .global(true)
                .help("Root for the downloads, separated, mixes and remuxed directories"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only log errors"),
        )
        .subcommand(
            Command::new("layout")
                .about("Print the channel layout name for a stem count")
                .arg(
                    Arg::new("COUNT")
                        .help("Number of stems")
                        .required(true)
                        .value_parser(value_parser!(usize))
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("discover")
                .about("List the stems of a directory in channel order")
                .arg(dir_arg(1)),
        )
        .subcommand(
            Command::new("merge")
                .about("Assemble the stems of a directory into multichannel_stems.wav")
                .arg(dir_arg(1)),
        )
        .subcommand(
            Command::new("remux")
                .about("Replace a video's audio with the multichannel stem stream")
                .arg(video_arg().index(1))
                .arg(dir_arg(2)),
        )
        .subcommand(
            Command::new("separate")
                .about("Separate a video into stems, then remux it with them")
                .arg(video_arg().index(1))
                .arg(
                    Arg::new("model")
                        .long("model")
                        .short('m')
                        .value_name("MODEL")
                        .help("Separation model (defaults to STEMMUX_MODEL or htdemucs_6s)"),
                ),
        )
        .subcommand(
            Command::new("download")
                .about("Download a video into the downloads directory")
                .arg(
                    Arg::new("URL")
                        .help("Video URL")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("mix")
                .about("Render a per-stem gain mix and remux it with a video")
                .arg(dir_arg(1))
                .arg(video_arg().long("video").short('v'))
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_name("NAME")
                        .required(true)
                        .help("File name of the exported video inside the mixes directory"),
                )
                .arg(
                    Arg::new("gain")
                        .long("gain")
                        .short('g')
                        .value_name("STEM=GAIN")
                        .action(ArgAction::Append)
                        .help("Gain for one stem; repeatable. Unlisted stems play at 1.0"),
                )
                .arg(
                    Arg::new("gains-json")
                        .long("gains-json")
                        .value_name("PATH")
                        .help("JSON object of stem gains; --gain values override it"),
                ),
        )
        .subcommand(Command::new("list-remuxed").about("List remuxed videos as JSON"))
        .subcommand(
            Command::new("cleanup").about("Remove and recreate every work directory"),
        )
}

fn dir_arg(index: usize) -> Arg {
    Arg::new("DIR")
        .help("Directory holding the stem files")
        .required(true)
        .index(index)
}

fn video_arg() -> Arg {
    Arg::new("VIDEO")
        .value_name("VIDEO")
        .help("Source video file")
        .required(true)
}

#[macro_use]
extern crate clap;

use clap::{AppSettings, Arg, SubCommand};
use tracing_subscriber::EnvFilter;

use bytecraft::ExitStatus;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = app_from_crate!()
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("asm")
                .about("Assembles a source file into a BVM container")
                .arg(
                    Arg::with_name("INPUT")
                        .help("Sets the source file to assemble")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("OUTPUT")
                        .required(true)
                        .help("Sets the container file to write"),
                ),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Loads a BVM container and runs it to halt")
                .arg(
                    Arg::with_name("PROGRAM")
                        .help("Sets the container file to run")
                        .required(true)
                        .index(1),
                ),
        )
        .get_matches();

    let code = match matches.subcommand() {
        ("asm", Some(sub)) => {
            let input = sub.value_of("INPUT").unwrap();
            let output = sub.value_of("output").unwrap();
            match bvm::assemble_file(input, output) {
                Ok(()) => 0,
                Err(err) => {
                    eprintln!("{}", err);
                    1
                }
            }
        }
        ("run", Some(sub)) => {
            let program = sub.value_of("PROGRAM").unwrap();
            match bvm::run_file(program) {
                Ok(machine) => match machine.exit_status() {
                    ExitStatus::Clean => 0,
                    status => {
                        eprintln!("machine faulted: {:?} (rF = {:#010x})", status, machine.flags());
                        1
                    }
                },
                Err(err) => {
                    eprintln!("{}", err);
                    1
                }
            }
        }
        _ => unreachable!(),
    };

    std::process::exit(code);
}

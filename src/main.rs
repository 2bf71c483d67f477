#[macro_use]
extern crate clap;
#[macro_use]
extern crate quick_error;

use std::io;
use std::process;
use std::time::Instant;

use log::{error, info, Level};
use simple_logger::init_with_level;

mod cli;
mod utils;


quick_error! {
    #[derive(Debug)]
    pub enum Error {
        Tis(err: tisgtf::Error) {
            display("{}", err)
            from()
            cause(err)
        }
        Io(err: io::Error) {
            display("{}", err)
            from()
            cause(err)
        }
        Clap(err: clap::Error) {
            display("{}", err)
            from()
            cause(err)
        }
        MissingArgument(name: &'static str) {
            display("required argument '{}' has no value", name)
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;


fn main() {
    let start = Instant::now();
    if let Err(err) = init_with_level(Level::Info) {
        eprintln!("error: {}", err);
        process::exit(1);
    }

    let matches = cli::build_cli().get_matches();
    if let Err(err) = cli::run(&matches) {
        error!("{}", err);
        process::exit(1);
    }

    info!("Elapsed time: {:.3?}", start.elapsed());
}

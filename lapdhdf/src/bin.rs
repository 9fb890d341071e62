use std::{env, io, process};

use tracing_subscriber::EnvFilter;

pub fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: lapdcheck <file.hdf5>");
        process::exit(2);
    };

    match lapdhdf::File::open(&path) {
        Ok(handle) => handle.overview().print(),
        Err(e) => {
            eprintln!("lapdcheck: {e}");
            process::exit(1);
        }
    }
}

use std::time;

use rayon::prelude::*;

use lapdhdf::{File, ReadOptions};
use lapdhdf_map::faux::FauxLapd;

fn main() -> Result<(), lapdhdf::FileError> {
    // stand-in for a real run file
    let faux = FauxLapd::builder()
        .connections(&[(0, &[0, 1, 2, 3]), (1, &[0, 1, 2, 3])])
        .nshot(50)
        .nt(4096)
        .build()?;

    let handle = File::open(faux.path())?;
    let digi = handle.file_map().main_digitizer().unwrap();
    let connections: Vec<(u32, u32)> = digi.configs()["config01"]
        .connections
        .iter()
        .flat_map(|c| c.channels.iter().map(|&ch| (c.board, ch)))
        .collect();

    let start = time::Instant::now();

    let samples: usize = connections
        .par_iter()
        .map(|&(board, channel)| {
            let data = handle
                .read_data(board, channel, &ReadOptions::default())
                .unwrap();
            data.signal.len()
        })
        .sum();

    let elapsed = start.elapsed().as_secs_f64();
    eprintln!("{samples} samples in {elapsed:0.3} sec");

    Ok(())
}

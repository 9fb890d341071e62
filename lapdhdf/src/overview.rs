//! A human-readable report of everything mapped in a file.
//!
//! The layout follows the run-log printouts used around the lab: a tree of
//! `|-- ` indented items, each padded with `~` out to a status column.

use std::io::{self, Write};

use lapdhdf_map::{AdcConnection, DigiConfig, Sis3301Map};

use crate::wrap::File;

const STATUS_COLUMN: usize = 55;

/// Report builder for one open [`File`].
pub struct Overview<'a> {
    file: &'a File,
}

impl<'a> Overview<'a> {
    pub(crate) fn new(file: &'a File) -> Self {
        Self { file }
    }

    /// Write the report to stdout.
    pub fn print(&self) -> io::Result<()> {
        let stdout = io::stdout();
        self.report(&mut stdout.lock())
    }

    /// Write the report to `out`.
    pub fn report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.report_general(out)?;
        self.report_msi(out)?;
        self.report_data(out)?;
        Ok(())
    }

    fn report_general<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{:=^72}", " HDF5 file overview ")?;
        writeln!(out, "Filename: {}", self.file.path().display())?;
        status_print(
            out,
            0,
            "Generated by LaPD",
            "yes",
            &format!("(v{})", self.file.lapd_version()),
            '~',
        )
    }

    fn report_msi<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let map = self.file.file_map();
        let found = if map.has_msi_group() { "found" } else { "missing" };
        status_print(out, 0, "MSI/", found, "", '~')?;
        if map.msi().is_empty() {
            status_print(out, 1, "None known", "", "", ' ')?;
        }
        for name in map.msi().keys() {
            status_print(out, 1, name, "mapped", "", '~')?;
        }
        Ok(())
    }

    fn report_data<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let map = self.file.file_map();
        let found = if map.has_data_group() { "found" } else { "missing" };
        status_print(out, 0, "Raw data + config/", found, "", '~')?;

        let drs = if map.has_data_run_sequence() { "yes" } else { "no" };
        status_print(out, 1, "Data run sequence", drs, "", '~')?;

        // no motion-control devices are mapped yet
        status_print(out, 1, "Motion Lists", "", "", ' ')?;
        status_print(out, 2, "None known", "", "", ' ')?;

        status_print(
            out,
            1,
            &format!("Digitizers ({})", map.digitizers().len()),
            "",
            "",
            ' ',
        )?;
        let main = map.main_digitizer().map(|d| d.name().to_string());
        for (name, digi) in map.digitizers() {
            let note = if main.as_deref() == Some(name.as_str()) {
                "(main)"
            } else {
                ""
            };
            status_print(out, 2, name, note, "", '~')?;
            report_digitizer(out, digi)?;
        }

        status_print(
            out,
            1,
            &format!("Control Devices ({})", map.controls().len()),
            "",
            "",
            ' ',
        )?;
        for (name, control) in map.controls() {
            status_print(out, 2, name, &control.contype().to_string(), "", '~')?;
        }

        status_print(
            out,
            1,
            &format!("Unknowns ({})", map.unknowns().len()),
            "",
            "",
            ' ',
        )?;
        for path in map.unknowns() {
            status_print(out, 2, path, "", "", ' ')?;
        }
        Ok(())
    }
}

fn report_digitizer<W: Write>(out: &mut W, digi: &Sis3301Map) -> io::Result<()> {
    let active = digi.active_configs().len();
    let inactive = digi.configs().len() - active;
    status_print(
        out,
        3,
        &format!("Configurations Detected ({})", digi.configs().len()),
        "",
        &format!("({active} active, {inactive} inactive)"),
        ' ',
    )?;
    for config in digi.configs().values() {
        report_config(out, config)?;
    }
    Ok(())
}

fn report_config<W: Write>(out: &mut W, config: &DigiConfig) -> io::Result<()> {
    let used = if config.active { "used" } else { "not used" };
    status_print(out, 4, &config.name, used, "", '~')?;
    status_print(out, 5, &format!("Path: {}", config.path), "", "", ' ')?;
    for conn in &config.connections {
        status_print(
            out,
            5,
            &format!("({}, {:?})", conn.board, conn.channels),
            "",
            &connection_note(conn),
            ' ',
        )?;
    }
    Ok(())
}

fn connection_note(conn: &AdcConnection) -> String {
    let fmt_avg = |avg: Option<u32>| match avg {
        Some(n) => n.to_string(),
        None => "None".to_string(),
    };
    format!(
        "{}-bit, {}, shot ave. {}, sample ave. {}",
        conn.info.bit,
        conn.info.clock_rate,
        fmt_avg(conn.info.shot_average),
        fmt_avg(conn.info.sample_average),
    )
}

/// One report line: indented item, padded out to the status column, then a
/// 7-wide status and an optional note.
fn status_print<W: Write>(
    out: &mut W,
    indent: usize,
    item: &str,
    found: &str,
    note: &str,
    pad: char,
) -> io::Result<()> {
    let mut line = "|-- ".repeat(indent);
    line.push_str(item);
    line.push(' ');
    while line.chars().count() < STATUS_COLUMN {
        line.push(pad);
    }
    write!(out, "{line}{found:<7}")?;
    if note.is_empty() {
        writeln!(out)
    } else {
        writeln!(out, " {note}")
    }
}

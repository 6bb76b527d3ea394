//! Command execution: listing, checksum verification and extraction.
//!
//! Human-readable output goes to the supplied writer (standard output in the
//! binary). Diagnostics go through `tracing`.

use crate::config::ExtractConfig;
use crate::error::CliError;
use spdpac_formats::{ChecksumReport, ExtractReport, PacFile, PacSummary, Progress};
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use tracing::{info, warn};

/// Run the command described by `config`, writing user output to `out`.
///
/// # Errors
///
/// Returns the first fatal error, or `CliError::Incomplete` when the
/// keep-going policy recorded partition failures.
pub fn run<W: Write>(config: &ExtractConfig, out: &mut W) -> Result<(), CliError> {
    config.validate()?;

    let pac = PacFile::open_with(&config.input, config.decode_mode())?;
    run_with(pac, config, out)
}

/// Same as [`run`] for an already decoded container.
///
/// # Errors
///
/// See [`run`].
pub fn run_with<R, W>(
    mut pac: PacFile<R>,
    config: &ExtractConfig,
    out: &mut W,
) -> Result<(), CliError>
where
    R: Read + Seek,
    W: Write,
{
    for rejected in pac.rejected() {
        warn!("Skipping partition record: {}", rejected);
    }

    if config.check_crc {
        let report = pac.verify_checksums()?;
        write_checksums(&report, out)?;
    }

    if config.list {
        let summary = pac.summary();
        if config.json {
            serde_json::to_writer_pretty(&mut *out, &summary)?;
            writeln!(out)?;
        } else {
            write_listing(&summary, out)?;
        }
        return Ok(());
    }

    let out_dir = config
        .output_dir()
        .ok_or_else(|| CliError::Config("missing output directory".to_string()))?;

    let report = extract(&mut pac, config, out_dir, out)?;
    write_report(&report, out_dir, out)?;

    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::Incomplete {
            failed: report.failures.len(),
            attempted: report.failures.len() + report.extracted.len(),
        })
    }
}

fn extract<R, W>(
    pac: &mut PacFile<R>,
    config: &ExtractConfig,
    out_dir: &Path,
    out: &mut W,
) -> Result<ExtractReport, CliError>
where
    R: Read + Seek,
    W: Write,
{
    let mut printer = ProgressPrinter::new(out);
    let options = config.extract_options();
    let report = pac.extract_all(out_dir, &options, |p| printer.update(p))?;
    printer.finish()?;
    Ok(report)
}

/// Renders per-partition percentages on a single rewritten line
struct ProgressPrinter<'w, W> {
    out: &'w mut W,
    current: Option<usize>,
    error: Option<io::Error>,
}

impl<'w, W: Write> ProgressPrinter<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Self {
            out,
            current: None,
            error: None,
        }
    }

    fn update(&mut self, p: &Progress<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.render(p) {
            self.error = Some(e);
        }
    }

    fn render(&mut self, p: &Progress<'_>) -> io::Result<()> {
        if self.current != Some(p.index) {
            if self.current.is_some() {
                writeln!(self.out)?;
            }
            self.current = Some(p.index);
        }
        write!(self.out, "\r{} {:3}%", p.file_name, p.percent)?;
        self.out.flush()
    }

    fn finish(self) -> io::Result<()> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.current.is_some() {
            writeln!(self.out)?;
        }
        Ok(())
    }
}

fn write_checksums<W: Write>(report: &ChecksumReport, out: &mut W) -> io::Result<()> {
    match report.header {
        Some(header) => writeln!(out, "{} OK: {:#06x}", header.region, header.computed)?,
        None => writeln!(out, "CRC1 (header) not present, skipped")?,
    }
    writeln!(out, "{} OK: {:#06x}", report.body.region, report.body.computed)
}

/// Print header metadata followed by one row per descriptor
pub fn write_listing<W: Write>(summary: &PacSummary, out: &mut W) -> io::Result<()> {
    writeln!(out, "Version:        {}", summary.version)?;
    writeln!(out, "Size:           {}", summary.size)?;
    writeln!(out, "Product name:   {}", summary.product_name)?;
    writeln!(out, "Firmware name:  {}", summary.firmware_name)?;
    writeln!(out, "Product alias:  {}", summary.product_alias)?;
    writeln!(out, "Partitions:     {}", summary.partition_count)?;
    writeln!(out, "Table offset:   {:#x}", summary.partition_table_offset)?;
    writeln!(
        out,
        "Flags:          mode={} flash_type={} nand_strategy={} nv_backup={}",
        summary.mode, summary.flash_type, summary.nand_strategy, summary.is_nv_backup
    )?;
    writeln!(out, "Magic:          {:#010x}", summary.magic)?;
    writeln!(out, "CRC:            {:#06x} {:#06x}", summary.crc1, summary.crc2)?;
    writeln!(out)?;

    writeln!(
        out,
        "{:>3}  {:<16} {:<32} {:>12} {:>12}  flags",
        "#", "partition", "file", "size", "offset"
    )?;
    for p in &summary.partitions {
        writeln!(
            out,
            "{:>3}  {:<16} {:<32} {:>12} {:>#12x}  file={} check={} omit={}",
            p.index,
            p.partition_name,
            p.file_name,
            p.size,
            p.offset,
            p.file_flag,
            p.check_flag,
            p.can_omit_flag
        )?;
    }
    writeln!(
        out,
        "{} partitions, {} payload bytes",
        summary.partitions.len(),
        summary.payload_bytes()
    )
}

fn write_report<W: Write>(report: &ExtractReport, out_dir: &Path, out: &mut W) -> io::Result<()> {
    for failure in &report.failures {
        writeln!(out, "FAILED {}: {}", failure.file_name, failure.error)?;
    }
    info!(
        "Extracted {} files ({} bytes) to {}",
        report.extracted.len(),
        report.bytes_written(),
        out_dir.display()
    );
    writeln!(
        out,
        "{} files extracted, {} skipped, {} failed",
        report.extracted.len(),
        report.skipped.len(),
        report.failures.len()
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use spdpac_formats::{PacHeader, PartitionDescriptor};

    #[test]
    fn test_progress_printer_lines() {
        let mut buf = Vec::new();
        let mut printer = ProgressPrinter::new(&mut buf);
        for (index, percent) in [(0, 50), (0, 100), (1, 100)] {
            printer.update(&Progress {
                index,
                file_name: if index == 0 { "a.bin" } else { "b.bin" },
                copied: 0,
                total: 1,
                percent,
            });
        }
        printer.finish().unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "\ra.bin  50%\ra.bin 100%\n\rb.bin 100%\n");
    }

    #[test]
    fn test_progress_printer_idle() {
        let mut buf = Vec::new();
        ProgressPrinter::new(&mut buf).finish().unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_listing_rows() {
        let mut header = PacHeader::new();
        header.partition_count = 2;
        let summary = PacSummary::new(
            &header,
            &[
                PartitionDescriptor::new("FDL", "fdl1.bin", 0x1000, 300),
                PartitionDescriptor::new("FLASH", "", 0, 0),
            ],
        );

        let mut buf = Vec::new();
        write_listing(&summary, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Version:        BP_R1.0.0"));
        assert!(text.contains("fdl1.bin"));
        assert!(text.contains("0x1000"));
        assert!(text.ends_with("2 partitions, 300 payload bytes\n"));
    }
}

//! Rendering of resolution results as text, JSON or CSV

use crate::resolve::ResolvedInfo;
use anstyle::{AnsiColor, Color, Style};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

const CYAN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
const GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Width of the first prefix column in text output
const PREFIX_COLUMN_WIDTH: usize = 35;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// Comma separated values
    Csv,
}

/// Render `info` to stdout or to `out_file`
///
/// JSON and CSV go to the file instead of stdout when one is given. Text is
/// always printed, and with a file the JSON document is saved there as well.
pub fn render(
    info: &ResolvedInfo,
    format: OutputFormat,
    show_prefixes: bool,
    out_file: Option<&Path>,
) -> Result<()> {
    let stdout = io::stdout();
    let color = stdout.is_terminal();

    match (format, out_file) {
        (OutputFormat::Text, file) => {
            // The file is written first so a failure leaves stdout empty
            if let Some(path) = file {
                write_to_file(path, |w| write_json(w, info))?;
            }
            write_text(&mut stdout.lock(), info, show_prefixes, color)?;
        }
        (OutputFormat::Json, Some(path)) => write_to_file(path, |w| write_json(w, info))?,
        (OutputFormat::Json, None) => write_json(&mut stdout.lock(), info)?,
        (OutputFormat::Csv, Some(path)) => {
            write_to_file(path, |w| write_csv(w, info, show_prefixes))?;
        }
        (OutputFormat::Csv, None) => write_csv(&mut stdout.lock(), info, show_prefixes)?,
    }
    Ok(())
}

fn write_to_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write(&mut file)?;
    file.flush()
        .with_context(|| format!("failed to write {}", path.display()))
}

fn paint(style: Style, color: bool) -> Style {
    if color {
        style
    } else {
        Style::new()
    }
}

/// Write the text rendering
pub fn write_text<W: Write>(
    w: &mut W,
    info: &ResolvedInfo,
    show_prefixes: bool,
    color: bool,
) -> Result<()> {
    let cyan = paint(CYAN, color);
    let green = paint(GREEN, color);
    let yellow = paint(YELLOW, color);

    writeln!(w, "{}Query:{} {}", cyan.render(), cyan.render_reset(), info.query)?;
    if let Some(ip) = &info.resolved_ip {
        writeln!(
            w,
            "  {}Resolved IP:{} {}",
            yellow.render(),
            yellow.render_reset(),
            ip
        )?;
    }
    writeln!(w, "  {}ASN:{} {}", green.render(), green.render_reset(), info.asn)?;
    writeln!(
        w,
        "  {}Description:{} {}",
        cyan.render(),
        cyan.render_reset(),
        info.description
    )?;

    if show_prefixes && !info.prefixes.is_empty() {
        writeln!(w, "  {}Prefixes:{}", yellow.render(), yellow.render_reset())?;
        for pair in info.prefixes.chunks(2) {
            match pair {
                [left, right] => {
                    writeln!(w, "    {left:<width$}{right}", width = PREFIX_COLUMN_WIDTH)?;
                }
                [left] => writeln!(w, "    {left:<width$}", width = PREFIX_COLUMN_WIDTH)?,
                _ => {}
            }
        }
    }
    Ok(())
}

/// Write the JSON rendering
pub fn write_json<W: Write>(w: &mut W, info: &ResolvedInfo) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, info)?;
    writeln!(w)?;
    Ok(())
}

/// Write the CSV rendering
///
/// The column layout depends on the query kind: prefix listings get one
/// row per prefix, address lookups carry the resolved IP.
pub fn write_csv<W: Write>(w: &mut W, info: &ResolvedInfo, show_prefixes: bool) -> Result<()> {
    let mut writer = csv::Writer::from_writer(w);

    if show_prefixes {
        writer.write_record(["ASN", "Description", "Prefix"])?;
        for prefix in &info.prefixes {
            writer.write_record([info.asn.as_str(), info.description.as_str(), prefix.as_str()])?;
        }
    } else if let Some(ip) = &info.resolved_ip {
        writer.write_record(["Query", "IP", "ASN", "Description"])?;
        writer.write_record([
            info.query.as_str(),
            ip.as_str(),
            info.asn.as_str(),
            info.description.as_str(),
        ])?;
    } else {
        writer.write_record(["Query", "ASN", "Description"])?;
        writer.write_record([
            info.query.as_str(),
            info.asn.as_str(),
            info.description.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip_info() -> ResolvedInfo {
        ResolvedInfo {
            query: "dns.google".to_string(),
            asn: "AS15169".to_string(),
            description: "GOOGLE, US".to_string(),
            prefixes: Vec::new(),
            resolved_ip: Some("8.8.8.8".to_string()),
        }
    }

    fn prefix_info() -> ResolvedInfo {
        ResolvedInfo {
            query: "13335".to_string(),
            asn: "AS13335".to_string(),
            description: "CLOUDFLARENET".to_string(),
            prefixes: vec![
                "1.1.1.0/24".to_string(),
                "104.16.0.0/13".to_string(),
                "2606:4700::/32".to_string(),
            ],
            resolved_ip: None,
        }
    }

    fn rendered(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_plain() {
        let out = rendered(|w| write_text(w, &ip_info(), false, false));
        assert_eq!(
            out,
            "Query: dns.google\n  Resolved IP: 8.8.8.8\n  ASN: AS15169\n  Description: GOOGLE, US\n"
        );
    }

    #[test]
    fn test_text_prefix_columns() {
        let out = rendered(|w| write_text(w, &prefix_info(), true, false));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[3], "  Prefixes:");
        assert_eq!(lines[4], format!("    {:<35}104.16.0.0/13", "1.1.1.0/24"));
        assert_eq!(lines[5].trim_end(), "    2606:4700::/32");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_text_colored() {
        let out = rendered(|w| write_text(w, &ip_info(), false, true));
        assert!(out.contains("\u{1b}["));
        assert!(out.contains("AS15169"));
    }

    #[test]
    fn test_json() {
        let out = rendered(|w| write_json(w, &prefix_info()));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["asn"], "AS13335");
        assert_eq!(value["prefixes"].as_array().unwrap().len(), 3);
        assert!(value.get("ip").is_none());
    }

    #[test]
    fn test_csv_ip_query() {
        let out = rendered(|w| write_csv(w, &ip_info(), false));
        assert_eq!(
            out,
            "Query,IP,ASN,Description\ndns.google,8.8.8.8,AS15169,\"GOOGLE, US\"\n"
        );
    }

    #[test]
    fn test_csv_prefixes() {
        let out = rendered(|w| write_csv(w, &prefix_info(), true));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ASN,Description,Prefix");
        assert_eq!(lines[1], "AS13335,CLOUDFLARENET,1.1.1.0/24");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_csv_without_ip() {
        let mut info = ip_info();
        info.resolved_ip = None;
        let out = rendered(|w| write_csv(w, &info, false));
        assert!(out.starts_with("Query,ASN,Description\n"));
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        render(&prefix_info(), OutputFormat::Csv, true, Some(&path)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("ASN,Description,Prefix"));

        let path = dir.path().join("out.json");
        render(&ip_info(), OutputFormat::Json, false, Some(&path)).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["ip"], "8.8.8.8");
    }

    #[test]
    fn test_render_text_unwritable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let result = render(&ip_info(), OutputFormat::Text, false, Some(&path));
        assert!(result.is_err());
        assert!(!path.exists());
    }
}

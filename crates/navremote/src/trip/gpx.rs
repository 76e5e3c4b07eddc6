//! GPX 1.1 writer.

use std::fmt::Write;

use chrono::SecondsFormat;

use super::{TripError, TripRecord};

const CREATOR: &str = concat!("navremote ", env!("CARGO_PKG_VERSION"));

/// Write `record` as a GPX document with a single track and segment.
pub fn write_gpx(record: &TripRecord) -> Result<String, TripError> {
    let mut out = String::with_capacity(256 + record.locations.len() * 96);

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<gpx version="1.1" creator="{CREATOR}" xmlns="http://www.topografix.com/GPX/1/1">"#
    )?;

    if let Some(started_at) = record.started_at {
        writeln!(
            out,
            "  <metadata><time>{}</time></metadata>",
            started_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )?;
    }

    writeln!(out, "  <trk>")?;
    if let Some(name) = &record.name {
        writeln!(out, "    <name>{}</name>", escape(name))?;
    }
    writeln!(out, "    <trkseg>")?;

    for point in &record.locations {
        write!(out, r#"      <trkpt lat="{}" lon="{}">"#, point.latitude, point.longitude)?;
        if let Some(altitude) = point.altitude {
            write!(out, "<ele>{altitude}</ele>")?;
        }
        if let Some(timestamp) = point.timestamp {
            write!(out, "<time>{}</time>", timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))?;
        }
        writeln!(out, "</trkpt>")?;
    }

    writeln!(out, "    </trkseg>")?;
    writeln!(out, "  </trk>")?;
    writeln!(out, "</gpx>")?;

    Ok(out)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

use chrono::{DateTime, Utc};

/// Revision name format: `<file_id>_<YYYY-MM-DD-HH:MM:SS.sss>`. Used both as
/// the staging filename and, for container 1, as the per-revision artifact
/// stem. Parse and format are kept symmetric by routing both directions
/// through this module.
pub fn format_revision_name(file_id: u64, archive_time: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        file_id,
        archive_time.format("%Y-%m-%d-%H:%M:%S%.3f")
    )
}

/// Parse a revision name back into its file id and timestamp. Returns `None`
/// if the name does not match the expected shape.
pub fn parse_revision_name(name: &str) -> Option<(u64, DateTime<Utc>)> {
    let (id_part, time_part) = name.split_once('_')?;
    let file_id: u64 = id_part.parse().ok()?;
    let naive = chrono::NaiveDateTime::parse_from_str(time_part, "%Y-%m-%d-%H:%M:%S%.3f").ok()?;
    Some((file_id, naive.and_utc()))
}

pub fn human(bytes: u64) -> String {
    use humansize::{format_size, BINARY};
    format_size(bytes, BINARY)
}

pub fn print_banner() {
    use colored::Colorize;
    println!(
        "{}",
        format!(
            " ▲ Custodian v{}  — content-addressed archival engine ",
            env!("CARGO_PKG_VERSION")
        )
        .black()
        .on_cyan()
        .bold()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_name_round_trips() {
        let ts = DateTime::parse_from_rfc3339("2026-07-26T10:20:30.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let name = format_revision_name(42, ts);
        assert_eq!(name, "42_2026-07-26-10:20:30.123");
        let (id, parsed) = parse_revision_name(&name).unwrap();
        assert_eq!(id, 42);
        assert_eq!(parsed, ts);
    }
}

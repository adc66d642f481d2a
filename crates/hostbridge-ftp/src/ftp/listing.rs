//! LIST output → entry names.
//!
//! Recognised line shapes:
//! 1. **Unix-style** (`ls -l`): `-rw-r--r-- 1 owner group 1234 Jan  1 12:00 file name.txt`
//! 2. **Windows/IIS-style**: `01-01-26  12:00AM      <DIR> My Documents`
//! 3. Anything else: the last whitespace-separated field.
//!
//! Only the name is kept; the listing API exposes no metadata.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNIX_LINE: Regex = Regex::new(
        r"(?x)
        ^[dlcbps-][rwxsStT-]{9}[@+.]?\s+   # permissions
        \d+\s+                              # link count
        \S+\s+                              # owner
        \S+\s+                              # group
        \d+\s+                              # size
        \w{3}\s+\d{1,2}\s+[\d:]+\s          # date
        (.+)$                               # name (possibly with -> target)
        ",
    )
    .expect("unix listing regex");
    static ref WINDOWS_LINE: Regex = Regex::new(
        r"(?x)
        ^\d{2}-\d{2}-\d{2,4}\s+             # date
        \d{1,2}:\d{2}(?:AM|PM)?\s+          # time
        (?:<DIR>|\d+)\s+                    # size or <DIR>
        (.+)$                               # name
        ",
    )
    .expect("windows listing regex");
}

/// Parse a full LIST response body into entry names, dropping `.` and `..`.
pub fn parse_names(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !is_total_line(l))
        .filter_map(parse_name)
        .filter(|n| n != "." && n != "..")
        .collect()
}

/// `total 42` header emitted by `ls -l` style servers.
fn is_total_line(line: &str) -> bool {
    line.strip_prefix("total ")
        .is_some_and(|n| n.trim().bytes().all(|b| b.is_ascii_digit()))
}

fn parse_name(line: &str) -> Option<String> {
    if let Some(caps) = UNIX_LINE.captures(line) {
        let raw = caps.get(1)?.as_str().trim_start();
        let name = if line.starts_with('l') {
            raw.split_once(" -> ").map_or(raw, |(name, _)| name)
        } else {
            raw
        };
        return Some(name.to_string());
    }

    if let Some(caps) = WINDOWS_LINE.captures(line) {
        return Some(caps.get(1)?.as_str().to_string());
    }

    line.split_whitespace().last().map(str::to_string)
}

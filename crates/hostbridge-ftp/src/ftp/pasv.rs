//! PASV reply parsing.
//!
//! `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2).` → `h1.h2.h3.h4:(p1*256+p2)`

use crate::ftp::error::{TransferError, TransferResult};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Extract the data-connection address from a PASV reply line.
///
/// Only the text between the first `(` and the first `)` of the line is
/// considered; a `)` that comes before the `(` makes the reply malformed.
pub fn parse_pasv(line: &str) -> TransferResult<SocketAddrV4> {
    let inner = match (line.find('('), line.find(')')) {
        (Some(open), Some(close)) if open < close => &line[open + 1..close],
        _ => {
            return Err(TransferError::malformed_pasv(format!(
                "no address in PASV reply: {}",
                line
            )))
        }
    };

    let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
    if fields.len() < 6 {
        return Err(TransferError::malformed_pasv(format!(
            "expected 6 fields, got {}: {}",
            fields.len(),
            line
        )));
    }

    let mut nums = [0u8; 6];
    for (slot, field) in nums.iter_mut().zip(&fields) {
        *slot = field.parse::<u8>().map_err(|_| {
            TransferError::malformed_pasv(format!("bad PASV field '{}' in: {}", field, line))
        })?;
    }

    let ip = Ipv4Addr::new(nums[0], nums[1], nums[2], nums[3]);
    let port = u16::from(nums[4]) * 256 + u16::from(nums[5]);
    Ok(SocketAddrV4::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ftp::error::TransferErrorKind;

    #[test]
    fn standard_reply() {
        let addr = parse_pasv("227 Entering Passive Mode (127,0,0,1,200,13).").unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:51213");
    }

    #[test]
    fn tolerates_spaces() {
        let addr = parse_pasv("227 Entering Passive Mode (10, 1, 2, 3, 4, 1)").unwrap();
        assert_eq!(addr, SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 3), 1025));
    }

    #[test]
    fn too_few_fields() {
        let e = parse_pasv("227 Entering Passive Mode (127,0,0,1,200).").unwrap_err();
        assert_eq!(e.kind, TransferErrorKind::MalformedPasvResponse);
    }

    #[test]
    fn non_numeric_field() {
        let e = parse_pasv("227 (127,0,x,1,200,13)").unwrap_err();
        assert_eq!(e.kind, TransferErrorKind::MalformedPasvResponse);
    }

    #[test]
    fn out_of_range_field() {
        assert!(parse_pasv("227 (127,0,0,1,300,13)").is_err());
    }

    #[test]
    fn missing_parens() {
        assert!(parse_pasv("227 Entering Passive Mode 127,0,0,1,200,13").is_err());
        assert!(parse_pasv("227 Entering Passive Mode (127,0,0,1,200,13").is_err());
    }

    #[test]
    fn first_closing_paren_of_the_line_wins() {
        let e = parse_pasv("227 Passive :) (127,0,0,1,200,13)").unwrap_err();
        assert_eq!(e.kind, TransferErrorKind::MalformedPasvResponse);
        let addr = parse_pasv("227 Entering Passive Mode (127,0,0,1,200,13) (ignored)").unwrap();
        assert_eq!(addr.port(), 51213);
    }
}

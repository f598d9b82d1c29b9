//! Utility functions for control-protocol text conversion and display.
//!
//! Provides helpers for converting between the representations the daemon
//! uses and the ones callers want: frequency to channel, dBm to a quality
//! percentage and bars, printf-escaped SSIDs to plain strings.

use log::warn;
use std::collections::BTreeMap;

use crate::types::constants::{frequency, signal_strength};

/// Converts a Wi-Fi frequency in MHz to a channel number.
///
/// Supports 2.4GHz (channels 1-14), 5GHz, and 6GHz bands.
/// Returns `None` for frequencies outside known Wi-Fi bands.
pub(crate) fn channel_from_freq(mhz: u32) -> Option<u16> {
    match mhz {
        frequency::BAND_2_4_START..=frequency::BAND_2_4_END => {
            Some(((mhz - frequency::BAND_2_4_START) / frequency::CHANNEL_SPACING + 1) as u16)
        }
        frequency::BAND_2_4_CH14 => Some(14),
        frequency::BAND_5_START..=frequency::BAND_5_END => {
            Some(((mhz - frequency::BAND_5_START) / frequency::CHANNEL_SPACING) as u16)
        }
        frequency::BAND_6_START..=frequency::BAND_6_END => {
            Some(((mhz - frequency::BAND_6_START) / frequency::CHANNEL_SPACING + 1) as u16)
        }
        _ => None,
    }
}

/// Maps a signal level in dBm onto a 0-100 quality percentage.
///
/// Linear between -100 dBm (0%) and -50 dBm (100%), clamped outside.
pub(crate) fn quality_from_dbm(dbm: i32) -> u8 {
    let clamped = dbm.clamp(signal_strength::DBM_FLOOR, signal_strength::DBM_CEILING);
    let span = signal_strength::DBM_CEILING - signal_strength::DBM_FLOOR;
    ((clamped - signal_strength::DBM_FLOOR) * 100 / span) as u8
}

/// Converts signal quality (0-100) to a visual bar representation.
///
/// Returns a 4-character string using Unicode block characters:
/// - 0-24%:   `▂___` (1 bar)
/// - 25-49%:  `▂▄__` (2 bars)
/// - 50-74%:  `▂▄▆_` (3 bars)
/// - 75-100%: `▂▄▆█` (4 bars)
pub(crate) fn bars_from_quality(q: u8) -> &'static str {
    match q {
        0..=signal_strength::BAR_1_MAX => "▂___",
        signal_strength::BAR_2_MIN..=signal_strength::BAR_2_MAX => "▂▄__",
        signal_strength::BAR_3_MIN..=signal_strength::BAR_3_MAX => "▂▄▆_",
        _ => "▂▄▆█",
    }
}

/// Decodes an SSID as printed by the daemon in `LIST_NETWORKS` and
/// `SCAN_RESULTS`.
///
/// The daemon escapes `\`, `"`, `\e`, `\n`, `\r`, `\t` and every byte outside
/// printable ASCII as `\xNN`. Malformed escapes are kept verbatim. Byte
/// sequences that are not valid UTF-8 are decoded lossily.
pub(crate) fn decode_escaped_ssid(raw: &str) -> String {
    let src = raw.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        if src[i] != b'\\' || i + 1 >= src.len() {
            out.push(src[i]);
            i += 1;
            continue;
        }

        match src[i + 1] {
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'e' => out.push(0x1b),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'x' => {
                let hex = src.get(i + 2..i + 4).and_then(|h| std::str::from_utf8(h).ok());
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 4;
                        continue;
                    }
                    None => {
                        out.push(b'\\');
                        i += 1;
                        continue;
                    }
                }
            }
            _ => {
                out.push(b'\\');
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in SSID '{raw}': {e}");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Parses a `key=value` per line reply (as returned by `STATUS`).
///
/// Lines without `=` are skipped. Later duplicates win.
pub(crate) fn parse_key_values(reply: &str) -> BTreeMap<String, String> {
    reply
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim_end_matches('\r').to_string()))
        .collect()
}

/// Returns `true` for a non-empty string consisting solely of hex digits.
pub(crate) fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

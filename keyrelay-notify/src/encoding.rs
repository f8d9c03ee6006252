use keyrelay_shared::money::Cents;
use serde::{Deserialize, Serialize};

/// GSM 03.38 basic alphabet. Messages composed entirely of these characters
/// (plus the extended set) fit the standard 160-unit encoding.
pub const GSM7_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";

/// GSM 03.38 extended characters. Still standard encoding, but each one
/// consumes two units (escape + character).
pub const GSM7_EXTENDED: &str = "^{}\\[~]|€";

const STANDARD_SINGLE_SEGMENT: usize = 160;
const STANDARD_MULTI_SEGMENT: usize = 153;
const UNICODE_SINGLE_SEGMENT: usize = 70;
const UNICODE_MULTI_SEGMENT: usize = 67;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmsEncoding {
    /// GSM-7: 160 units per message, 153 when multi-part.
    Standard,
    /// UCS-2 fallback: 70 characters per message, 67 when multi-part.
    Unicode,
}

/// Cost breakdown for one message at a given per-segment price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsCostBreakdown {
    /// Adjusted length in encoding units, not raw characters.
    pub message_length: usize,
    pub encoding: SmsEncoding,
    pub segments: u32,
    pub cost_per_segment_cents: Cents,
    pub total_cost_cents: Cents,
    /// Characters outside both GSM-7 sets, in order of first appearance.
    pub non_standard_chars: Vec<char>,
}

impl SmsCostBreakdown {
    pub fn is_unicode(&self) -> bool {
        self.encoding == SmsEncoding::Unicode
    }
}

/// Classify a message: standard as long as every character is in the basic
/// or extended GSM set, Unicode as soon as a single character is not.
pub fn detect_encoding(text: &str) -> (SmsEncoding, Vec<char>) {
    let mut foreign = Vec::new();
    for ch in text.chars() {
        if !GSM7_BASIC.contains(ch) && !GSM7_EXTENDED.contains(ch) && !foreign.contains(&ch) {
            foreign.push(ch);
        }
    }
    let encoding = if foreign.is_empty() {
        SmsEncoding::Standard
    } else {
        SmsEncoding::Unicode
    };
    (encoding, foreign)
}

/// Compute segmentation and cost for one message.
///
/// Pure and deterministic; performs no I/O and touches no ledger. In
/// standard encoding, extended characters consume two units. In Unicode
/// encoding every character consumes exactly one unit and the per-message
/// capacity drops to 70 (67 multi-part).
pub fn calculate_sms_cost(text: &str, cost_per_segment_cents: Cents) -> SmsCostBreakdown {
    let (encoding, non_standard_chars) = detect_encoding(text);

    let message_length = match encoding {
        SmsEncoding::Standard => text
            .chars()
            .map(|ch| if GSM7_EXTENDED.contains(ch) { 2 } else { 1 })
            .sum(),
        SmsEncoding::Unicode => text.chars().count(),
    };

    let (single_cap, multi_cap) = match encoding {
        SmsEncoding::Standard => (STANDARD_SINGLE_SEGMENT, STANDARD_MULTI_SEGMENT),
        SmsEncoding::Unicode => (UNICODE_SINGLE_SEGMENT, UNICODE_MULTI_SEGMENT),
    };

    let segments = if message_length <= single_cap {
        1
    } else {
        message_length.div_ceil(multi_cap) as u32
    };

    SmsCostBreakdown {
        message_length,
        encoding,
        segments,
        cost_per_segment_cents,
        total_cost_cents: Cents::from(segments) * cost_per_segment_cents,
        non_standard_chars,
    }
}

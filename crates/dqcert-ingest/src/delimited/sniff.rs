use std::collections::BTreeMap;

/// Delimiters considered by the sniffer; earlier entries win ties.
pub const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

const SNIFF_LINES: usize = 20;

/// Guess the field delimiter from the leading lines of a file.
///
/// Each candidate is scored by how many lines share its most common non-zero
/// per-line count (outside double quotes). Without any hit the file is a
/// single-column comma file.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best: Option<(u8, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let mut frequencies: BTreeMap<usize, usize> = BTreeMap::new();
        for line in &lines {
            let count = count_outside_quotes(line, candidate);
            if count > 0 {
                *frequencies.entry(count).or_default() += 1;
            }
        }

        let consistent = frequencies.values().copied().max().unwrap_or(0);
        if consistent == 0 {
            continue;
        }
        if best.is_none_or(|(_, score)| consistent > score) {
            best = Some((candidate, consistent));
        }
    }

    best.map(|(delimiter, _)| delimiter).unwrap_or(b',')
}

fn count_outside_quotes(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

use std::collections::BTreeMap;
use std::io::{self, BufReader, Read};

/// Occurrence count of every byte value seen in one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
    total: u64,
}

impl FrequencyTable {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut table = FrequencyTable::default();
        for &byte in bytes {
            table.add(byte);
        }
        table
    }

    /// Counts every byte `reader` yields until end of stream.
    pub fn from_reader<R: Read>(reader: R) -> io::Result<Self> {
        let mut table = FrequencyTable::default();
        for byte in BufReader::new(reader).bytes() {
            table.add(byte?);
        }
        Ok(table)
    }

    fn add(&mut self, symbol: u8) {
        *self.counts.entry(symbol).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Total number of symbols counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct symbols with a non-zero count.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }
}

impl FromIterator<(u8, u64)> for FrequencyTable {
    /// Builds a table from explicit counts; zero counts are ignored.
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut table = FrequencyTable::default();
        for (symbol, count) in iter {
            if count == 0 {
                continue;
            }
            *table.counts.entry(symbol).or_insert(0) += count;
            table.total += count;
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn counts_bytes() {
        let table = FrequencyTable::from_bytes(b"abracadabra");
        assert_eq!(table.get(b'a'), 5);
        assert_eq!(table.get(b'b'), 2);
        assert_eq!(table.get(b'r'), 2);
        assert_eq!(table.get(b'c'), 1);
        assert_eq!(table.get(b'd'), 1);
        assert_eq!(table.get(b'z'), 0);
        assert_eq!(table.total(), 11);
        assert_eq!(table.distinct(), 5);
    }

    #[test]
    fn reader_and_slice_agree() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let from_reader = FrequencyTable::from_reader(Cursor::new(&data)).unwrap();
        assert_eq!(from_reader, FrequencyTable::from_bytes(&data));
    }

    #[test]
    fn iterates_in_symbol_order() {
        let table = FrequencyTable::from_bytes(b"zyx");
        let symbols: Vec<u8> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, vec![b'x', b'y', b'z']);
    }

    #[test]
    fn collect_skips_zero_counts() {
        let table: FrequencyTable = vec![(1, 0), (2, 3), (2, 1)].into_iter().collect();
        assert_eq!(table.distinct(), 1);
        assert_eq!(table.get(2), 4);
        assert!(!table.is_empty());
        assert!(FrequencyTable::default().is_empty());
    }
}

use crate::error::{Result, StationError};
use csv::{ReaderBuilder, Trim};
use std::{collections::BTreeMap, path::Path};

/// Embedded dock counts for the bike-share stations.
pub static CSV_CAPACITES_VELOS: &str = include_str!("../../fixtures/capacites-velos.csv");

/// Embedded total parking spaces for the car parks.
pub static CSV_CAPACITES_VOITURES: &str = include_str!("../../fixtures/capacites-voitures.csv");

/// Station display name -> capacity.
///
/// Names are matched exactly: "Comédie" and "Comedie" are different stations.
/// Capacities are signed so that a bad table entry reaches the fill formulas
/// instead of failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapacityTable {
    entries: BTreeMap<String, i32>,
}

impl CapacityTable {
    /// Dock counts for the bike-share stations.
    pub fn bikes() -> Result<CapacityTable> {
        CapacityTable::parse_capacity_csv(CSV_CAPACITES_VELOS)
    }

    /// Parking spaces for the car parks.
    pub fn cars() -> Result<CapacityTable> {
        CapacityTable::parse_capacity_csv(CSV_CAPACITES_VOITURES)
    }

    /// Load a capacity table from a CSV file on disk.
    pub fn from_path(path: &Path) -> Result<CapacityTable> {
        let csv_object = std::fs::read_to_string(path).map_err(|source| StationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CapacityTable::parse_capacity_csv(&csv_object)
    }

    /// Parse a CSV string of station capacities.
    ///
    /// Expected CSV columns (with headers): `NAME,CAPACITY`
    pub fn parse_capacity_csv(csv_object: &str) -> Result<CapacityTable> {
        let mut entries = BTreeMap::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(csv_object.as_bytes());
        for (index, row) in rdr.records().enumerate() {
            let record = row?;
            let row = index + 1;
            let name = record.get(0).unwrap_or("");
            if name.is_empty() {
                return Err(StationError::InvalidCapacity {
                    row,
                    reason: "blank station name".to_string(),
                });
            }
            let capacity_str = record.get(1).unwrap_or("");
            let capacity = capacity_str.parse::<i32>().map_err(|e| StationError::InvalidCapacity {
                row,
                reason: format!("capacity {capacity_str:?}: {e}"),
            })?;
            if entries.insert(name.to_string(), capacity).is_some() {
                return Err(StationError::DuplicateStation(name.to_string()));
            }
        }
        Ok(CapacityTable { entries })
    }

    /// Capacity of `name`, or `None` when the station is not in the table.
    pub fn lookup(&self, name: &str) -> Option<i32> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Station names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries.iter().map(|(name, capacity)| (name.as_str(), *capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::CapacityTable;
    use crate::error::StationError;

    #[test]
    fn test_bike_table() {
        let table = CapacityTable::bikes().unwrap();
        assert_eq!(table.len(), 57);
        assert_eq!(table.lookup("Albert 1er - Cathédrale"), Some(12));
        assert_eq!(table.lookup("Pérols Etang de l Or"), Some(68));
        assert_eq!(table.lookup("Comédie"), Some(18));
        assert_eq!(table.lookup("Comedie Baudin"), Some(8));
    }

    #[test]
    fn test_car_table() {
        let table = CapacityTable::cars().unwrap();
        assert_eq!(table.len(), 24);
        assert_eq!(table.lookup("Polygone"), Some(1911));
        assert_eq!(table.lookup("Vicarello"), Some(64));
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = CapacityTable::cars().unwrap();
        assert_eq!(table.lookup("Comedie"), Some(664));
        assert_eq!(table.lookup("Comédie"), None);
        assert_eq!(table.lookup("comedie"), None);
        assert_eq!(table.lookup("Comedie "), None);
    }

    #[test]
    fn test_parse_trims_fields() {
        let table = CapacityTable::parse_capacity_csv("NAME,CAPACITY\n TestDock , 10 \n").unwrap();
        assert_eq!(table.lookup("TestDock"), Some(10));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["TestDock"]);
    }

    #[test]
    fn test_parse_keeps_non_positive_capacity() {
        let table = CapacityTable::parse_capacity_csv("NAME,CAPACITY\nClosed,0\n").unwrap();
        assert_eq!(table.lookup("Closed"), Some(0));
    }

    #[test]
    fn test_parse_rejects_bad_capacity() {
        let err = CapacityTable::parse_capacity_csv("NAME,CAPACITY\nTestDock,ten\n").unwrap_err();
        assert!(matches!(err, StationError::InvalidCapacity { row: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let err = CapacityTable::parse_capacity_csv("NAME,CAPACITY\nA,1\nA,2\n").unwrap_err();
        assert!(matches!(err, StationError::DuplicateStation(name) if name == "A"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capacities.csv");
        std::fs::write(&path, "NAME,CAPACITY\nTestDock,10\n").unwrap();
        let table = CapacityTable::from_path(&path).unwrap();
        assert_eq!(table.lookup("TestDock"), Some(10));
        assert!(CapacityTable::from_path(&dir.path().join("missing.csv")).is_err());
    }
}

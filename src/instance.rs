//! Module for loading and representing TSP instances.
//!
//! An instance is a fixed set of labelled cities with Euclidean coordinates and a
//! designated start city. The pairwise distance table is computed once at
//! construction and never touched again; every fitness evaluation borrows it.
//!
//! Instances can be built in code, taken from the built-in ten-city layout, or
//! loaded from a TSPLIB-style coordinate file or a `name,x,y` CSV file.

use crate::error::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A named city with planar coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Unique label
    #[serde(rename = "name")]
    pub label: String,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl City {
    pub fn new(label: impl Into<String>, x: f64, y: f64) -> Self {
        City { label: label.into(), x, y }
    }

    /// Euclidean distance to another city
    pub fn distance_to(&self, other: &City) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// A complete TSP instance with its precomputed distance table
#[derive(Debug, Clone)]
pub struct TSPInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    cities: Vec<City>,
    start: usize,
    distance_matrix: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

impl TSPInstance {
    /// Build an instance from a city list and the label of the start city.
    ///
    /// Fails if the set is empty, a label is repeated, a coordinate is not
    /// finite, or the start label is unknown.
    pub fn new(name: impl Into<String>, cities: Vec<City>, start: &str) -> Result<Self> {
        if cities.is_empty() {
            return Err(SolverError::EmptyCitySet);
        }

        let mut index = HashMap::with_capacity(cities.len());
        for (i, city) in cities.iter().enumerate() {
            if !city.x.is_finite() || !city.y.is_finite() {
                return Err(SolverError::InvalidCoordinate {
                    label: city.label.clone(),
                    x: city.x,
                    y: city.y,
                });
            }
            if index.insert(city.label.clone(), i).is_some() {
                return Err(SolverError::DuplicateCity(city.label.clone()));
            }
        }

        let start = *index
            .get(start)
            .ok_or_else(|| SolverError::UnknownStartCity(start.to_string()))?;
        let distance_matrix = Self::compute_distance_matrix(&cities);

        Ok(TSPInstance {
            name: name.into(),
            comment: String::new(),
            cities,
            start,
            distance_matrix,
            index,
        })
    }

    /// The ten-city layout A..J used by the reference run, starting at A
    pub fn ten_cities() -> Self {
        let cities = vec![
            City::new("A", 100.0, 300.0),
            City::new("B", 200.0, 130.0),
            City::new("C", 300.0, 500.0),
            City::new("D", 500.0, 390.0),
            City::new("E", 700.0, 300.0),
            City::new("F", 900.0, 600.0),
            City::new("G", 800.0, 950.0),
            City::new("H", 600.0, 560.0),
            City::new("I", 350.0, 550.0),
            City::new("J", 270.0, 350.0),
        ];

        Self::new("ten-cities", cities, "A").expect("built-in layout is valid")
    }

    /// Load an instance from disk.
    ///
    /// Files ending in `.csv` are read as `name,x,y` records; anything else is
    /// parsed as TSPLIB (`NODE_COORD_SECTION`, node ids become labels). The first
    /// city is the start unless `start` names another one.
    pub fn from_file<P: AsRef<Path>>(path: P, start: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let (name, comment, cities) = if is_csv {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            (name, String::new(), Self::read_csv(path)?)
        } else {
            Self::read_tsplib(path)?
        };

        let start = match start {
            Some(label) => label.to_string(),
            None => cities
                .first()
                .map(|c| c.label.clone())
                .ok_or(SolverError::EmptyCitySet)?,
        };

        let mut instance = Self::new(name, cities, &start)?;
        instance.comment = comment;
        log::debug!(
            "Loaded instance '{}' from {:?}: {} cities, start {}",
            instance.name,
            path,
            instance.num_cities(),
            instance.start_label()
        );
        Ok(instance)
    }

    fn read_csv(path: &Path) -> Result<Vec<City>> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let mut cities = Vec::new();
        for record in reader.deserialize() {
            let city: City = record?;
            cities.push(city);
        }
        Ok(cities)
    }

    fn read_tsplib(path: &Path) -> Result<(String, String, Vec<City>)> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut cities = Vec::new();
        let mut in_coords = false;
        let mut last_line = 0;

        for (lineno, line) in reader.lines().enumerate() {
            let lineno = lineno + 1;
            last_line = lineno;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => {
                        name = value.to_string();
                        continue;
                    }
                    "COMMENT" => {
                        comment = value.to_string();
                        continue;
                    }
                    "DIMENSION" => {
                        let parsed = value.parse().map_err(|_| SolverError::Parse {
                            line: lineno,
                            message: format!("invalid dimension '{}'", value),
                        })?;
                        dimension = Some(parsed);
                        continue;
                    }
                    "TYPE" | "EDGE_WEIGHT_TYPE" => continue,
                    _ => {}
                }
            }

            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if line.ends_with("_SECTION") {
                in_coords = false;
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(SolverError::Parse {
                        line: lineno,
                        message: format!("expected 'id x y', got '{}'", line),
                    });
                }
                let coord = |s: &str| -> Result<f64> {
                    s.parse().map_err(|_| SolverError::Parse {
                        line: lineno,
                        message: format!("invalid coordinate '{}'", s),
                    })
                };
                cities.push(City::new(parts[0], coord(parts[1])?, coord(parts[2])?));
            }
        }

        if let Some(dim) = dimension {
            if dim != cities.len() {
                return Err(SolverError::Parse {
                    line: last_line,
                    message: format!("DIMENSION is {} but {} coordinates were read", dim, cities.len()),
                });
            }
        }

        Ok((name, comment, cities))
    }

    /// Compute Euclidean distance matrix
    fn compute_distance_matrix(cities: &[City]) -> Vec<Vec<f64>> {
        let n = cities.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in i + 1..n {
                let d = cities[i].distance_to(&cities[j]);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }

        matrix
    }

    /// Get the distance between two cities by index
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Distance between two cities by label, `None` if either is unknown
    pub fn distance_between(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.distance(self.city_index(a)?, self.city_index(b)?))
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    /// Index of the start city
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn start_label(&self) -> &str {
        &self.cities[self.start].label
    }

    pub fn city_index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, i: usize) -> &str {
        &self.cities[i].label
    }

    /// All cities except the start, in declaration order
    pub fn identity_tour(&self) -> Vec<usize> {
        (0..self.cities.len()).filter(|&i| i != self.start).collect()
    }

    /// Length of a closed route (first and last entries are the start city)
    pub fn tour_length(&self, route: &[usize]) -> f64 {
        route.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// Length of the closed route `[start] + tour + [start]`
    pub fn route_distance(&self, tour: &[usize]) -> f64 {
        let mut length = 0.0;
        let mut prev = self.start;
        for &city in tour {
            length += self.distance(prev, city);
            prev = city;
        }
        length + self.distance(prev, self.start)
    }

    /// Wrap a tour with the start city at both ends
    pub fn closed_route(&self, tour: &[usize]) -> Vec<usize> {
        let mut route = Vec::with_capacity(tour.len() + 2);
        route.push(self.start);
        route.extend_from_slice(tour);
        route.push(self.start);
        route
    }

    pub fn route_labels(&self, route: &[usize]) -> Vec<String> {
        route.iter().map(|&i| self.cities[i].label.clone()).collect()
    }

    /// Check that `tour` visits every non-start city exactly once
    pub fn is_valid_tour(&self, tour: &[usize]) -> bool {
        let n = self.cities.len();
        if tour.len() != n - 1 {
            return false;
        }

        let mut seen = vec![false; n];
        for &city in tour {
            if city >= n || city == self.start || seen[city] {
                return false;
            }
            seen[city] = true;
        }
        true
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.cities.len();
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                distances.push(self.distance(i, j));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            num_cities: n,
            start: self.start_label().to_string(),
            avg_distance,
            max_distance,
            identity_tour_length: self.route_distance(&self.identity_tour()),
        }
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_cities: usize,
    pub start: String,
    pub avg_distance: f64,
    pub max_distance: f64,
    pub identity_tour_length: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {} (start {} + {} to visit)", self.num_cities, self.start, self.num_cities - 1)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)?;
        write!(f, "  Identity-order tour: {:.2}", self.identity_tour_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("tsp-ga-{}-{}", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_distance_calculation() {
        let cities = vec![City::new("o", 0.0, 0.0), City::new("p", 3.0, 4.0)];
        let matrix = TSPInstance::compute_distance_matrix(&cities);

        assert!((matrix[0][1] - 5.0).abs() < 1e-10);
        assert!((matrix[1][0] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_distance_symmetry() {
        let instance = TSPInstance::ten_cities();
        let n = instance.num_cities();
        for a in 0..n {
            assert_eq!(instance.distance(a, a), 0.0);
            for b in 0..n {
                assert_eq!(instance.distance(a, b), instance.distance(b, a));
                assert!(instance.distance(a, b) >= 0.0);
            }
        }
        assert_eq!(instance.distance_between("A", "B"), instance.distance_between("B", "A"));
        assert!(instance.distance_between("A", "Z").is_none());
    }

    #[test]
    fn test_route_distance_matches_tour_length() {
        let instance = TSPInstance::ten_cities();
        let tour = instance.identity_tour();
        let closed = instance.closed_route(&tour);

        assert_eq!(closed.len(), 11);
        assert_eq!(closed.first(), closed.last());
        assert!((instance.tour_length(&closed) - instance.route_distance(&tour)).abs() < 1e-9);
    }

    #[test]
    fn test_identity_tour_length() {
        let instance = TSPInstance::ten_cities();
        let labels = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "A"];
        let expected: f64 = labels
            .windows(2)
            .map(|w| instance.distance_between(w[0], w[1]).unwrap())
            .sum();

        assert!((instance.statistics().identity_tour_length - expected).abs() < 1e-9);
    }

    #[test]
    fn test_single_city_instance() {
        let instance = TSPInstance::new("solo", vec![City::new("A", 1.0, 1.0)], "A").unwrap();
        assert!(instance.identity_tour().is_empty());
        assert_eq!(instance.route_distance(&[]), 0.0);
        assert!(instance.is_valid_tour(&[]));
    }

    #[test]
    fn test_invalid_instances() {
        assert!(matches!(
            TSPInstance::new("empty", Vec::new(), "A"),
            Err(SolverError::EmptyCitySet)
        ));
        assert!(matches!(
            TSPInstance::new("x", vec![City::new("A", 0.0, 0.0)], "B"),
            Err(SolverError::UnknownStartCity(label)) if label == "B"
        ));
        assert!(matches!(
            TSPInstance::new("x", vec![City::new("A", 0.0, 0.0), City::new("A", 1.0, 1.0)], "A"),
            Err(SolverError::DuplicateCity(_))
        ));
        assert!(matches!(
            TSPInstance::new("x", vec![City::new("A", f64::NAN, 0.0)], "A"),
            Err(SolverError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_is_valid_tour() {
        let instance = TSPInstance::ten_cities();
        let mut tour = instance.identity_tour();
        assert!(instance.is_valid_tour(&tour));

        tour[0] = tour[1];
        assert!(!instance.is_valid_tour(&tour));

        let mut with_start = instance.identity_tour();
        with_start[3] = instance.start();
        assert!(!instance.is_valid_tour(&with_start));

        let short = &instance.identity_tour()[1..];
        assert!(!instance.is_valid_tour(short));
    }

    #[test]
    fn test_load_tsplib() {
        let path = write_temp(
            "small.tsp",
            "NAME: small\nCOMMENT: three nodes\nTYPE: TSP\nDIMENSION: 3\nEDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n1 0 0\n2 3 4\n3 6 0\nEOF\n",
        );
        let instance = TSPInstance::from_file(&path, None).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(instance.name, "small");
        assert_eq!(instance.comment, "three nodes");
        assert_eq!(instance.num_cities(), 3);
        assert_eq!(instance.start_label(), "1");
        assert!((instance.distance_between("1", "2").unwrap() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_load_tsplib_dimension_mismatch() {
        let path = write_temp("bad.tsp", "NAME: bad\nDIMENSION: 4\nNODE_COORD_SECTION\n1 0 0\n2 1 1\nEOF\n");
        let result = TSPInstance::from_file(&path, None);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(SolverError::Parse { .. })));
    }

    #[test]
    fn test_load_csv_with_start() {
        let path = write_temp("cities.csv", "name,x,y\nP,0,0\nQ,10,0\nR, 10, 10\n");
        let instance = TSPInstance::from_file(&path, Some("Q")).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(instance.num_cities(), 3);
        assert_eq!(instance.start_label(), "Q");
        assert_eq!(instance.identity_tour(), vec![0, 2]);
        assert!((instance.distance_between("Q", "R").unwrap() - 10.0).abs() < 1e-10);
    }
}

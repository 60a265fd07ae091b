use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use visitmap::{CountryVisitRecord, MapData, Traveler, WorldBoundaries};

/// Load a map-data JSON document (`{"countries": [...]}`)
pub fn load_map_data(path: &Path) -> Result<MapData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading map data {}", path.display()))?;
    let data = MapData::from_json(&content)
        .with_context(|| format!("parsing map data {}", path.display()))?;
    log::info!("Loaded {} country records from {}", data.countries.len(), path.display());
    Ok(data)
}

/// Small built-in dataset shown when no data file is given
pub fn demo_data() -> MapData {
    let mina = Traveler::new(1, "Mina");
    let joon = Traveler::new(2, "Joon");
    let sora = Traveler::new(3, "Sora");

    MapData::new(vec![
        CountryVisitRecord::new("KR", "South Korea", 24)
            .with_travelers(vec![mina.clone(), joon.clone(), sora.clone()]),
        CountryVisitRecord::new("JP", "Japan", 12).with_travelers(vec![mina.clone(), joon.clone()]),
        CountryVisitRecord::new("TW", "Taiwan", 6).with_travelers(vec![mina.clone()]),
        CountryVisitRecord::new("VN", "Vietnam", 7).with_travelers(vec![joon.clone(), sora.clone()]),
        CountryVisitRecord::new("TH", "Thailand", 3).with_travelers(vec![sora.clone()]),
        CountryVisitRecord::new("FR", "France", 2).with_travelers(vec![mina]),
        CountryVisitRecord::new("US", "United States", 1).with_travelers(vec![joon]),
    ])
}

/// Background boundary load. The receiver yields exactly one result unless
/// it is dropped first, in which case the result is discarded.
pub fn spawn_boundary_load(path: PathBuf) -> Receiver<visitmap::Result<WorldBoundaries>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        log::info!("Loading boundaries from {}", path.display());
        let result = WorldBoundaries::load(&path);
        if let Err(e) = &result {
            log::error!("Boundary load failed: {}", e);
        }
        // Receiver gone means the view was torn down
        let _ = tx.send(result);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_demo_data_is_valid() {
        let data = demo_data();
        assert_eq!(data.countries.len(), 7);
        assert!(data.find("kr").is_some());
    }

    #[test]
    fn test_missing_boundary_file_reports_error() {
        let rx = spawn_boundary_load(PathBuf::from("/nonexistent/countries.geojson"));
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        drop(spawn_boundary_load(PathBuf::from("/nonexistent/countries.geojson")));
    }

    #[test]
    fn test_missing_data_file_has_context() {
        let err = load_map_data(Path::new("/nonexistent/data.json")).unwrap_err();
        assert!(err.to_string().contains("reading map data"));
    }
}

// Process-owned cache of pairwise travel costs

use crate::error::Result;
use crate::models::{Coordinate, Leg};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::sync::RwLock;

/// Default number of coordinate pairs kept before the oldest is evicted
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Coordinates are rounded to 5 decimal places (~1.1 m) before keying
const GRID_SCALE: f64 = 1e5;

/// A coordinate snapped to the cache grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
struct GridPoint(i64, i64);

impl GridPoint {
    fn from_coordinate(coordinate: &Coordinate) -> Self {
        Self(
            (coordinate.lat * GRID_SCALE).round() as i64,
            (coordinate.lng * GRID_SCALE).round() as i64,
        )
    }
}

// Endpoints are stored in ascending order, so a->b and b->a share an entry
type PairKey = (GridPoint, GridPoint);

fn pair_key(a: &Coordinate, b: &Coordinate) -> PairKey {
    let (a, b) = (GridPoint::from_coordinate(a), GridPoint::from_coordinate(b));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<PairKey, Leg>,
    insertion_order: VecDeque<PairKey>,
}

/// Hit and miss counters since the cache was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Cache of travel costs keyed by rounded coordinate pair
///
/// The cache is created and owned by the process and handed to each
/// optimization by reference. It is safe to share across threads. When
/// full, the oldest inserted pair is evicted.
#[derive(Debug)]
pub struct DistanceCache {
    capacity: usize,
    state: RwLock<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

// On-disk format
#[derive(Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<CachedPair>,
}

#[derive(Serialize, Deserialize)]
struct CachedPair {
    from: GridPoint,
    to: GridPoint,
    distance: f64,
    duration: f64,
}

impl DistanceCache {
    /// Creates an empty cache holding at most `capacity` pairs; a capacity
    /// of zero disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Looks up the cost between two coordinates
    pub fn get(&self, from: &Coordinate, to: &Coordinate) -> Option<Leg> {
        let found = self
            .state
            .read()
            .ok()
            .and_then(|state| state.entries.get(&pair_key(from, to)).copied());

        match found {
            Some(_) => self.hits.fetch_add(1, Relaxed),
            None => self.misses.fetch_add(1, Relaxed),
        };
        found
    }

    /// Stores the cost between two coordinates
    pub fn insert(&self, from: &Coordinate, to: &Coordinate, leg: Leg) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut state) = self.state.write() else {
            return;
        };
        Self::insert_key(&mut state, self.capacity, pair_key(from, to), leg);
    }

    fn insert_key(state: &mut CacheState, capacity: usize, key: PairKey, leg: Leg) {
        if state.entries.insert(key, leg).is_some() {
            return;
        }
        state.insertion_order.push_back(key);
        while state.insertion_order.len() > capacity {
            if let Some(oldest) = state.insertion_order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
    }

    /// Number of cached pairs
    pub fn len(&self) -> usize {
        self.state
            .read()
            .map(|state| state.entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached pair
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            state.entries.clear();
            state.insertion_order.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Relaxed),
            misses: self.misses.load(Relaxed),
        }
    }

    /// Writes the cache to a JSON file, oldest entry first
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let entries = match self.state.read() {
            Ok(state) => state
                .insertion_order
                .iter()
                .filter_map(|key| {
                    state.entries.get(key).map(|leg| CachedPair {
                        from: key.0,
                        to: key.1,
                        distance: leg.distance,
                        duration: leg.duration,
                    })
                })
                .collect(),
            Err(_) => Vec::new(),
        };

        let json = serde_json::to_string_pretty(&CacheFile { entries })?;
        fs::write(path.as_ref(), json)?;
        debug!("Distance cache saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reads a cache previously written by [`DistanceCache::save_json`]
    pub fn load_json<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let file: CacheFile = serde_json::from_str(&json)?;

        let cache = Self::new(capacity);
        if capacity > 0 {
            if let Ok(mut state) = cache.state.write() {
                for pair in file.entries {
                    let leg = Leg::new(pair.distance, pair.duration);
                    if leg.is_valid() {
                        let key = if pair.from <= pair.to {
                            (pair.from, pair.to)
                        } else {
                            (pair.to, pair.from)
                        };
                        Self::insert_key(&mut state, capacity, key, leg);
                    }
                }
            }
        }

        info!(
            "Loaded {} distance cache entries from {}",
            cache.len(),
            path.as_ref().display()
        );
        Ok(cache)
    }
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

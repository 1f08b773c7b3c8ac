use cityfinder_data_processing::CityRecord;
use tracing::debug;

use super::CityHit;

/// Straight-line distance between two cities in degree space.
///
/// Latitude and longitude are treated as plane coordinates, so this is not a
/// great-circle distance and does not wrap at the antimeridian.
pub fn planar_distance(origin: &CityRecord, candidate: &CityRecord) -> f64 {
    let d_lat = candidate.latitude - origin.latitude;
    let d_lon = candidate.longitude - origin.longitude;
    (d_lat * d_lat + d_lon * d_lon).sqrt()
}

/// The `top_k` candidates closest to `origin`, nearest first.
///
/// The origin itself is not skipped: when it is among the candidates it comes first at
/// distance zero. Equal distances keep candidate order. A non-positive `top_k` gives an
/// empty result.
pub fn rank_by_proximity<'a, I>(origin: &CityRecord, candidates: I, top_k: i64) -> Vec<CityHit>
where
    I: IntoIterator<Item = &'a CityRecord>,
{
    let Ok(top_k) = usize::try_from(top_k) else {
        return Vec::new();
    };
    if top_k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(f64, &CityRecord)> = candidates
        .into_iter()
        .map(|candidate| (planar_distance(origin, candidate), candidate))
        .collect();
    debug!(candidates = ranked.len(), top_k, "Ranking by proximity");

    // Stable, so ties stay in candidate order.
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    ranked.truncate(top_k);

    ranked.into_iter().map(|(_, city)| city.into()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(id: u32, name: &str, latitude: f64, longitude: f64) -> CityRecord {
        CityRecord {
            geoname_id: id,
            name: name.to_string(),
            asciiname: name.to_string(),
            latitude,
            longitude,
            ..Default::default()
        }
    }

    fn cities() -> Vec<CityRecord> {
        vec![
            city(1, "Origin", 0.0, 0.0),
            city(2, "Far", 10.0, 10.0),
            city(3, "Near", 1.0, 0.0),
            city(4, "Mid", 0.0, 3.0),
            city(5, "NearToo", 0.0, -1.0),
        ]
    }

    #[test]
    fn test_planar_distance() {
        let a = city(1, "a", 0.0, 0.0);
        let b = city(2, "b", 3.0, 4.0);

        assert_eq!(planar_distance(&a, &b), 5.0);
        assert_eq!(planar_distance(&b, &a), 5.0);
        assert_eq!(planar_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_planar_distance_does_not_wrap_longitude() {
        let east = city(1, "east", 0.0, 179.0);
        let west = city(2, "west", 0.0, -179.0);

        assert_eq!(planar_distance(&east, &west), 358.0);
    }

    #[test]
    fn test_origin_first_then_by_distance_ties_in_order() {
        let cities = cities();
        let hits = rank_by_proximity(&cities[0], &cities, 10);

        let ids: Vec<u32> = hits.iter().map(CityHit::geoname_id).collect();
        assert_eq!(ids, vec![1, 3, 5, 4, 2]);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let cities = cities();

        assert_eq!(rank_by_proximity(&cities[0], &cities, 2).len(), 2);
        assert_eq!(rank_by_proximity(&cities[0], &cities, 5).len(), 5);
        assert_eq!(rank_by_proximity(&cities[0], &cities, 50).len(), 5);
    }

    #[test]
    fn test_non_positive_top_k_is_empty() {
        let cities = cities();

        assert!(rank_by_proximity(&cities[0], &cities, 0).is_empty());
        assert!(rank_by_proximity(&cities[0], &cities, -3).is_empty());
    }

    #[test]
    fn test_origin_outside_candidates() {
        let cities = cities();
        let hits = rank_by_proximity(&cities[0], &cities[1..], 1);

        assert_eq!(hits, vec![CityHit("Near".to_string(), 3)]);
    }

    #[test]
    fn test_output_uses_display_name() {
        let mut munich = city(7, "München", 48.1, 11.6);
        munich.asciiname = "Munich".to_string();

        let hits = rank_by_proximity(&munich, std::iter::once(&munich), 1);
        assert_eq!(hits[0].name(), "München");
    }
}

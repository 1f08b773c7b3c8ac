use std::io::Write;

use tempfile::NamedTempFile;
use tracing::info;

use super::error::Result;

/// Configuration for test data generation
#[derive(Debug, Clone)]
pub struct TestDataConfig {
    /// Number of city rows to write
    pub rows: usize,
    /// Whether to use realistic data or minimal test data
    pub realistic_data: bool,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self::sample()
    }
}

impl TestDataConfig {
    /// Minimal data for unit tests
    pub fn minimal() -> Self {
        Self {
            rows: 3,
            realistic_data: false,
        }
    }

    /// Sample data for integration tests
    pub fn sample() -> Self {
        Self {
            rows: 40,
            realistic_data: true,
        }
    }
}

struct TestCity {
    geoname_id: u32,
    name: &'static str,
    asciiname: &'static str,
    alternatenames: &'static str,
    latitude: f64,
    longitude: f64,
    feature_code: &'static str,
    country_code: &'static str,
    admin1_code: &'static str,
    population: i64,
    dem: i32,
    timezone: &'static str,
    modification_date: &'static str,
}

const fn city(
    geoname_id: u32,
    name: &'static str,
    asciiname: &'static str,
    alternatenames: &'static str,
    latitude: f64,
    longitude: f64,
    country_code: &'static str,
    admin1_code: &'static str,
    population: i64,
    timezone: &'static str,
) -> TestCity {
    TestCity {
        geoname_id,
        name,
        asciiname,
        alternatenames,
        latitude,
        longitude,
        feature_code: "PPL",
        country_code,
        admin1_code,
        population,
        dem: 0,
        timezone,
        modification_date: "2024-01-18",
    }
}

// The first three rows make up the minimal data set.
const BASE_CITIES: [TestCity; 30] = [
    TestCity {
        feature_code: "PPLA2",
        dem: 26,
        ..city(5392171, "San Jose", "San Jose", "SJC,San Jose,San José", 37.33939, -121.89496, "US", "CA", 1026908, "America/Los_Angeles")
    },
    TestCity {
        feature_code: "PPLA2",
        dem: 28,
        ..city(5391959, "San Francisco", "San Francisco", "SF,San Fran", 37.77493, -122.41942, "US", "CA", 864816, "America/Los_Angeles")
    },
    city(9900002, "Josean Sands", "Josean Sands", "", 36.0, -120.0, "US", "CA", 1200, "America/Los_Angeles"),
    city(9900001, "San Jacinto Jose", "San Jacinto Jose", "", 33.78, -116.95, "US", "CA", 4800, "America/Los_Angeles"),
    city(5368361, "Los Angeles", "Los Angeles", "LA,Los Angeles", 34.05223, -118.24368, "US", "CA", 3971883, "America/Los_Angeles"),
    city(5128581, "New York City", "New York City", "NYC,New York", 40.71427, -74.00597, "US", "NY", 8804190, "America/New_York"),
    city(4164138, "Miami", "Miami", "MIA", 25.77427, -80.19366, "US", "FL", 442241, "America/New_York"),
    city(3621849, "San José", "San Jose", "San Jose de Costa Rica", 9.93333, -84.08333, "CR", "08", 335007, "America/Costa_Rica"),
    city(1701668, "Manila", "Manila", "Maynila", 14.6042, 120.9822, "PH", "NCR", 1600000, "Asia/Manila"),
    city(2988507, "Paris", "Paris", "Lutetia,Paname", 48.85341, 2.3488, "FR", "11", 2138551, "Europe/Paris"),
    city(2950159, "Berlin", "Berlin", "Berlino,Berlim", 52.52437, 13.41053, "DE", "16", 3426354, "Europe/Berlin"),
    city(2867714, "München", "Munich", "Munchen,Monaco di Baviera", 48.13743, 11.57549, "DE", "02", 1260391, "Europe/Berlin"),
    city(2643743, "London", "London", "Londres,Londra", 51.50853, -0.12574, "GB", "ENG", 8961989, "Europe/London"),
    city(2995469, "Marseille", "Marseille", "Marsiglia", 43.29695, 5.38107, "FR", "93", 870731, "Europe/Paris"),
    city(3117735, "Madrid", "Madrid", "Madrit", 40.4165, -3.70256, "ES", "29", 3255944, "Europe/Madrid"),
    city(1850147, "Tokyo", "Tokyo", "Tokio,Edo", 35.6895, 139.69171, "JP", "40", 8336599, "Asia/Tokyo"),
    city(2147714, "Sydney", "Sydney", "SYD", -33.86785, 151.20732, "AU", "02", 4627345, "Australia/Sydney"),
    city(3435910, "Buenos Aires", "Buenos Aires", "BA,Baires", -34.61315, -58.37723, "AR", "07", 13076300, "America/Argentina/Buenos_Aires"),
    city(6167865, "Toronto", "Toronto", "YYZ", 43.70011, -79.4163, "CA", "08", 2600000, "America/Toronto"),
    city(1275339, "Mumbai", "Mumbai", "Bombay", 19.07283, 72.88261, "IN", "16", 12691836, "Asia/Kolkata"),
    city(2800866, "Brussels", "Brussels", "Bruxelles,Brussel", 50.85045, 4.34878, "BE", "BRU", 1019022, "Europe/Brussels"),
    city(2761369, "Vienna", "Vienna", "Wien", 48.20849, 16.37208, "AT", "09", 1691468, "Europe/Vienna"),
    city(3169070, "Rome", "Rome", "Roma", 41.89193, 12.51133, "IT", "07", 2318895, "Europe/Rome"),
    city(5809844, "Seattle", "Seattle", "SEA", 47.60621, -122.33207, "US", "WA", 737015, "America/Los_Angeles"),
    city(5746545, "Portland", "Portland", "PDX", 45.52345, -122.67621, "US", "OR", 652503, "America/Los_Angeles"),
    city(4887398, "Chicago", "Chicago", "CHI,Windy City", 41.85003, -87.65005, "US", "IL", 2720546, "America/Chicago"),
    city(2657896, "Zürich", "Zurich", "Zurigo,Zuerich", 47.36667, 8.55, "CH", "ZH", 341730, "Europe/Zurich"),
    city(3128760, "Barcelona", "Barcelona", "BCN", 41.38879, 2.15899, "ES", "56", 1620343, "Europe/Madrid"),
    city(1816670, "Beijing", "Beijing", "Peking,Pekin", 39.9075, 116.39723, "CN", "22", 18960744, "Asia/Shanghai"),
    city(3448439, "São Paulo", "Sao Paulo", "Sampa", -23.5475, -46.63611, "BR", "27", 10021295, "America/Sao_Paulo"),
];

/// Create a cities dump in a temporary file.
///
/// Rows beyond the built-in city list are synthetic `Testville N` entries in country `ZZ`.
pub fn create_test_data(config: &TestDataConfig) -> Result<NamedTempFile> {
    info!("Creating test data with config: {:?}", config);

    let mut file = NamedTempFile::new()?;
    let base_rows = if config.realistic_data {
        BASE_CITIES.len()
    } else {
        3
    };

    for c in BASE_CITIES.iter().take(config.rows.min(base_rows)) {
        write_city(&mut file, c)?;
    }
    for i in base_rows..config.rows {
        write_synthetic_city(&mut file, i)?;
    }

    file.flush()?;
    Ok(file)
}

/// Write raw, already tab-separated lines to a temporary dump file.
pub fn create_cities_file(lines: &[&str]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    file.flush()?;
    Ok(file)
}

fn write_city(file: &mut NamedTempFile, c: &TestCity) -> Result<()> {
    writeln!(
        file,
        "{}\t{}\t{}\t{}\t{}\t{}\tP\t{}\t{}\t\t{}\t\t\t\t{}\t\t{}\t{}\t{}",
        c.geoname_id,
        c.name,
        c.asciiname,
        c.alternatenames,
        c.latitude,
        c.longitude,
        c.feature_code,
        c.country_code,
        c.admin1_code,
        c.population,
        c.dem,
        c.timezone,
        c.modification_date,
    )?;
    Ok(())
}

fn write_synthetic_city(file: &mut NamedTempFile, i: usize) -> Result<()> {
    let latitude = -60.0 + ((i * 7) % 120) as f64 + 0.25;
    let longitude = -170.0 + ((i * 13) % 340) as f64 + 0.5;
    writeln!(
        file,
        "{}\tTestville {i}\tTestville {i}\t\t{latitude}\t{longitude}\tP\tPPL\tZZ\t\t01\t\t\t\t{}\t\t0\tEtc/UTC\t2024-01-18",
        9_000_000 + i,
        1000 + i,
    )?;
    Ok(())
}

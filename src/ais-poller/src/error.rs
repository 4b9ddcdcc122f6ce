use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to set up HTTP client"))]
    HttpClient {
        #[snafu(implicit)]
        location: Location,
        source: http_client::Error,
    },
    #[snafu(display("Invalid header value '{value}'"))]
    InvalidHeader {
        #[snafu(implicit)]
        location: Location,
        value: String,
        #[snafu(source)]
        error: http_client::header::InvalidHeaderValue,
    },
    #[snafu(display("Failed to open metadata cache"))]
    Cache {
        #[snafu(implicit)]
        location: Location,
        source: metadata_cache::Error,
    },
    #[snafu(display("Invalid configured position"))]
    Position {
        #[snafu(implicit)]
        location: Location,
        source: vessel_core::Error,
    },
    #[snafu(display("Failed to serialize delta"))]
    Serialize {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: serde_json::Error,
    },
    #[snafu(display("Failed to write delta"))]
    Write {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: std::io::Error,
    },
}

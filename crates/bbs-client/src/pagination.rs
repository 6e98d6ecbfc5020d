use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use bbs_core::error::BbsError;

use crate::BbsClient;

/// Envelope shared by every paged Bitbucket listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub values: Vec<T>,
    pub is_last_page: bool,
    #[serde(default)]
    pub next_page_start: Option<u64>,
}

/// Outcome of walking a paged listing.
///
/// A transport or decode failure stops the walk; the pages merged before
/// the failure are kept so callers can decide whether partial data is
/// usable.
#[derive(Debug)]
pub struct Paged<T> {
    pub values: Vec<T>,
    pub error: Option<BbsError>,
}

impl<T> Paged<T> {
    /// Treat any pagination failure as fatal, discarding partial results.
    pub fn into_result(self) -> Result<Vec<T>, BbsError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.values),
        }
    }
}

/// Walk a paged endpoint until the server reports the last page.
///
/// The first non-empty page seeds the accumulator verbatim; every later
/// page is placed in front of it, so the merged collection reverses the
/// server's page order. Consumers of the report rely on this order, so it
/// is kept as-is.
pub(crate) async fn fetch_all<T, F>(client: &BbsClient, endpoint_at: F) -> Paged<T>
where
    T: DeserializeOwned,
    F: Fn(u64) -> String,
{
    let mut merged: Vec<T> = Vec::new();
    let mut start = 0;

    loop {
        let endpoint = endpoint_at(start);
        let body = match client.get_api(&endpoint).await {
            Ok(body) => body,
            Err(e) => {
                return Paged {
                    values: merged,
                    error: Some(e),
                }
            }
        };
        let page: Page<T> = match serde_json::from_str(&body) {
            Ok(page) => page,
            Err(e) => {
                return Paged {
                    values: merged,
                    error: Some(BbsError::Decode {
                        message: e.to_string(),
                    }),
                }
            }
        };

        if merged.is_empty() {
            merged = page.values;
        } else {
            let mut next = page.values;
            next.append(&mut merged);
            merged = next;
        }

        if page.is_last_page {
            break;
        }
        start = page.next_page_start.unwrap_or(0);
        debug!(endpoint = %endpoint, next_start = start, "not the last page, fetching next");
    }

    Paged {
        values: merged,
        error: None,
    }
}

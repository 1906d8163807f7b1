use crate::step1_fetch::BatchSource;
use common::types::dataset::{DataSource, Dataset};
use itertools::Itertools;
use log::{debug, info};
use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use std::fmt::Display;
use url::Url;

/// Every link on a listing page, resolved against the page URL
pub async fn list_links(page_url: &Url) -> Result<Vec<Url>, SourceError> {
    let html = reqwest::get(page_url.clone()).await?
        .error_for_status()?
        .text().await?;

    extract_links(&html, page_url)
}

pub fn extract_links(html: &str, base: &Url) -> Result<Vec<Url>, SourceError> {
    let selector = Selector::parse("a[href]").map_err(|err| SourceError::Selector(err.to_string()))?;
    let document = Html::parse_document(html);

    Ok(document.select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .collect())
}

pub fn filter_links(links: Vec<Url>, pattern: &Regex) -> Vec<Url> {
    links.into_iter()
        .filter(|link| pattern.is_match(link.as_str()))
        .unique()
        .collect()
}

/// Expands the sources of a dataset into individual batches. Listing pages are scraped for
/// links matching the source's pattern, or the default pattern of the dataset kind.
pub async fn resolve_sources(dataset: &Dataset) -> Result<Vec<BatchSource>, SourceError> {
    let mut batches = vec![];

    for source in &dataset.sources {
        match source {
            DataSource::Listing { listing, pattern } => {
                let pattern = pattern.as_deref()
                    .or(dataset.kind.default_link_pattern())
                    .ok_or_else(|| SourceError::MissingPattern(dataset.id.clone()))?;
                let pattern = Regex::new(pattern)?;

                let links = filter_links(list_links(listing).await?, &pattern);
                info!(target: "sources", "Found {} batches of dataset '{}' on {}", links.len(), dataset.id, listing);
                batches.extend(links.into_iter().map(BatchSource::Url));
            }
            DataSource::URL { url } => batches.push(BatchSource::Url(url.clone())),
            DataSource::File { path } => batches.push(BatchSource::File(path.clone())),
        }
    }

    debug!(target: "sources", "Dataset '{}' has {} batches", dataset.id, batches.len());
    Ok(batches)
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    Reqwest(#[from] reqwest::Error),
    Pattern(#[from] regex::Error),
    Selector(String),
    MissingPattern(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceError::Reqwest(err) => err.fmt(f),
            SourceError::Pattern(err) => err.fmt(f),
            SourceError::Selector(err) => write!(f, "Invalid selector: {}", err),
            SourceError::MissingPattern(id) => {
                write!(f, "Dataset '{}' lists a page but has no `pattern:` to select its files", id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::dataset::DatasetKind;

    const LISTING: &str = r#"
        <html><body>
          <a href=" https://d37ci6vzurychx.cloudfront.net/trip-data/yellow_tripdata_2024-01.parquet ">Yellow Taxi Trip Records</a>
          <a href="https://d37ci6vzurychx.cloudfront.net/trip-data/yellow_tripdata_2024-01.parquet">Yellow Taxi Trip Records</a>
          <a href="https://d37ci6vzurychx.cloudfront.net/trip-data/green_tripdata_2024-01.parquet">Green Taxi Trip Records</a>
          <a href="https://d37ci6vzurychx.cloudfront.net/trip-data/fhvhv_tripdata_2024-01.parquet">High Volume For-Hire Vehicle Trip Records</a>
          <a href="https://d37ci6vzurychx.cloudfront.net/trip-data/yellow_tripdata_2019-12.parquet">Yellow Taxi Trip Records</a>
          <a href="/assets/tlc/downloads/pdf/data_dictionary_trip_records_yellow.pdf">Data dictionary</a>
          <a name="anchor-without-href">Top</a>
        </body></html>
    "#;

    fn page() -> Url {
        Url::parse("https://www.nyc.gov/site/tlc/about/tlc-trip-record-data.page").unwrap()
    }

    #[test]
    fn test_extract_links_resolves_relative_links() {
        let links = extract_links(LISTING, &page()).unwrap();

        assert_eq!(6, links.len());
        assert_eq!(
            "https://www.nyc.gov/assets/tlc/downloads/pdf/data_dictionary_trip_records_yellow.pdf",
            links[5].as_str()
        );
    }

    #[test]
    fn test_default_patterns_select_monthly_files() {
        let links = extract_links(LISTING, &page()).unwrap();

        let taxi = Regex::new(DatasetKind::Taxi.default_link_pattern().unwrap()).unwrap();
        let yellow = filter_links(links.clone(), &taxi);
        assert_eq!(1, yellow.len());
        assert!(yellow[0].as_str().ends_with("yellow_tripdata_2024-01.parquet"));

        let rideshare = Regex::new(DatasetKind::Rideshare.default_link_pattern().unwrap()).unwrap();
        let fhvhv = filter_links(links, &rideshare);
        assert_eq!(1, fhvhv.len());
        assert!(fhvhv[0].as_str().ends_with("fhvhv_tripdata_2024-01.parquet"));
    }

    #[tokio::test]
    async fn test_direct_sources_need_no_listing() {
        let yaml = r#"
id: weather
kind: weather
src:
  - url: https://example.com/weather/2024_weather.csv
  - path: ./data/2023_weather.csv
"#;
        let dataset: Dataset = serde_yml::from_str(yaml).unwrap();

        let batches = resolve_sources(&dataset).await.unwrap();

        assert_eq!(2, batches.len());
        assert_eq!(Some("2023_weather.csv".to_owned()), batches[1].file_name());
    }
}

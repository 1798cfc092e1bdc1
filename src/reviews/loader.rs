use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};

use super::ReviewDocument;

const MAX_RATING: f32 = 5.0;

/// Column positions resolved from the CSV header.
struct Columns {
    title: Option<usize>,
    date: Option<usize>,
    rating: Option<usize>,
    review: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> anyhow::Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };

        let Some(review) = find("review") else {
            bail!("review CSV has no 'Review' column (found: {:?})", headers);
        };

        Ok(Self {
            title: find("title"),
            date: find("date"),
            rating: find("rating"),
            review,
        })
    }
}

/// Loads every review from a CSV file with a `Title,Date,Rating,Review` header.
pub fn load_reviews(path: &Path) -> anyhow::Result<Vec<ReviewDocument>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open review file {}", path.display()))?;
    let reviews = parse_reviews(file)
        .with_context(|| format!("Failed to parse review file {}", path.display()))?;
    tracing::info!("Loaded {} reviews from {}", reviews.len(), path.display());
    Ok(reviews)
}

pub fn parse_reviews<R: Read>(reader: R) -> anyhow::Result<Vec<ReviewDocument>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(csv_reader.headers()?)?;
    let mut reviews = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = index + 2;
        let field = |column: Option<usize>| {
            column
                .and_then(|idx| record.get(idx))
                .filter(|value| !value.is_empty())
        };

        let Some(body) = field(Some(columns.review)) else {
            tracing::warn!("Skipping review on line {}: empty body", line);
            continue;
        };

        let rating = field(columns.rating).and_then(|raw| {
            let parsed = parse_rating(raw);
            if parsed.is_none() {
                tracing::warn!("Ignoring invalid rating {:?} on line {}", raw, line);
            }
            parsed
        });

        reviews.push(ReviewDocument::new(
            field(columns.title).unwrap_or_default(),
            body,
            rating,
            field(columns.date).map(str::to_string),
        ));
    }

    Ok(reviews)
}

fn parse_rating(raw: &str) -> Option<u8> {
    let value: f32 = raw.parse().ok()?;
    if !value.is_finite() || !(0.0..=MAX_RATING).contains(&value) {
        return None;
    }
    Some(value.round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Title,Date,Rating,Review
Best slice in town,2024-03-01,5,\"Delicious crust, fresh basil.\"
Never again,2024-03-04,1,Burnt pizza and cold wings.
No body,2024-03-05,3,
Odd rating,2024-03-06,great,Service was quick.
";

    #[test]
    fn parses_records_and_skips_empty_bodies() {
        let reviews = parse_reviews(SAMPLE.as_bytes()).unwrap();

        assert_eq!(reviews.len(), 3);
        assert_eq!(reviews[0].title, "Best slice in town");
        assert_eq!(reviews[0].body, "Delicious crust, fresh basil.");
        assert_eq!(reviews[0].rating, Some(5));
        assert_eq!(reviews[0].date.as_deref(), Some("2024-03-01"));
        assert_eq!(reviews[1].rating, Some(1));
        assert_eq!(reviews[2].rating, None);
    }

    #[test]
    fn header_matching_ignores_case_and_order() {
        let csv = "review,RATING\nGreat garlic knots,4.0\n";
        let reviews = parse_reviews(csv.as_bytes()).unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].title, "");
        assert_eq!(reviews[0].rating, Some(4));
    }

    #[test]
    fn missing_review_column_is_an_error() {
        let err = parse_reviews("Title,Rating\nHi,5\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Review"));
    }

    #[test]
    fn ratings_outside_scale_are_dropped() {
        assert_eq!(parse_rating("5"), Some(5));
        assert_eq!(parse_rating("3.6"), Some(4));
        assert_eq!(parse_rating("7"), None);
        assert_eq!(parse_rating("NaN"), None);
    }

    #[test]
    fn load_reviews_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_reviews(&tmp.path().join("missing.csv")).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }
}

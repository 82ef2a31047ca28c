use chrono::TimeDelta;
use serde_json::{json, Map, Value};

use job_parser::{
    JobParser, JobType, MemoryJobStore, ParserConfig, RawSource, SalaryFilter, StaticFetcher,
};

const BOARD_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <title>Careers | Initech</title>
    <script type="application/ld+json">
    {
        "@context": "https://schema.org",
        "@graph": [
            {"@type": "Organization", "name": "Initech"},
            {
                "@type": "JobPosting",
                "title": "Platform Engineer",
                "hiringOrganization": {"@type": "Organization", "name": "Initech"},
                "jobLocation": {"@type": "Place", "address": {
                    "addressLocality": "Austin", "addressRegion": "TX"
                }},
                "baseSalary": {"@type": "MonetaryAmount", "currency": "USD",
                    "value": {"minValue": 120000, "maxValue": 150000, "unitText": "YEAR"}}
            }
        ]
    }
    </script>
</head>
<body>
    <nav><a href="/">Home</a></nav>
    <main>
        <h1 class="posting-title">Platform Engineer (Contract)</h1>
        <div class="job-details">
            <p>12 month contract with the infrastructure group.</p>
            <script>window.dataLayer = [];</script>
        </div>
        <div class="qualifications">
            <ul><li>Lead on-call rotations</li><li>Kubernetes</li></ul>
        </div>
    </main>
</body>
</html>
"#;

fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

fn parser() -> JobParser {
    let fetcher = StaticFetcher::new()
        .with_page("https://careers.initech.test/platform", BOARD_PAGE)
        .with_page(
            "https://jobs.test/barista",
            r#"<h1>Barista</h1><span class="employer">Bean Co</span>
               <p class="location">Portland</p>
               <div class="description">Part-time weekend shifts.</div>"#,
        )
        .with_status("https://jobs.test/expired", 404);
    JobParser::new(fetcher, ParserConfig::default())
}

#[tokio::test]
async fn test_markup_and_structured_data_combined() {
    let record = parser()
        .parse_one("https://careers.initech.test/platform")
        .await
        .unwrap();

    // Markup wins where present, JSON-LD fills the rest
    assert_eq!(record.title, "Platform Engineer (Contract)");
    assert_eq!(record.company, "Initech");
    assert_eq!(record.location, "Austin, TX");
    assert_eq!(record.description, "12 month contract with the infrastructure group.");
    assert_eq!(record.requirements, "Lead on-call rotations\nKubernetes");
    assert_eq!(record.salary, "$120,000 - $150,000 per year");
    assert_eq!(record.job_type, JobType::Contract);
    assert_eq!(record.experience, "3+ years");

    let range = record.salary_range().unwrap();
    assert_eq!((range.min, range.max), (120_000, 150_000));
}

#[tokio::test]
async fn test_batch_of_urls_and_records() {
    let result = parser()
        .parse_many(vec![
            RawSource::from("https://careers.initech.test/platform"),
            RawSource::from("https://jobs.test/expired"),
            RawSource::from("https://jobs.test/barista"),
            RawSource::Record(obj(json!({
                "title": "Research Intern",
                "company": "Lab",
                "description": "Summer internship",
                "requirements": "Entry level",
                "postedDate": "2025-03-01",
            }))),
        ])
        .await;

    assert_eq!(result.failed, 1);
    let titles: Vec<_> = result.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        ["Platform Engineer (Contract)", "Barista", "Research Intern"]
    );

    let barista = &result.records[1];
    assert_eq!(barista.company, "Bean Co");
    assert_eq!(barista.location, "Portland");
    assert_eq!(barista.job_type, JobType::PartTime);
    assert_eq!(barista.salary, "Salary not specified");

    let intern = &result.records[2];
    assert_eq!(intern.job_type, JobType::Internship);
    assert_eq!(intern.experience, "Entry Level");
    assert_eq!(intern.posted_date.to_rfc3339(), "2025-03-01T00:00:00+00:00");
    assert_eq!(intern.deadline.to_rfc3339(), "2025-03-31T00:00:00+00:00");
}

#[tokio::test]
async fn test_ingest_into_store() {
    let store = MemoryJobStore::new().with_reject_duplicates(true);
    let report = parser()
        .ingest_many(
            &store,
            vec![
                RawSource::from("https://jobs.test/barista"),
                RawSource::Record(obj(json!({"title": "Barista", "company": "Bean Co"}))),
            ],
        )
        .await;

    assert_eq!(report.stored.len(), 1);
    assert_eq!(report.store_failures.len(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_bulk_records_keep_caller_values() {
    let records = parser().parse_bulk(&[
        obj(json!({
            "title": "Night Nurse",
            "type": "Part-time",
            "experience": "2 years",
            "deadline": "2025-12-01T00:00:00Z",
            "salary": "$60,000 - $75,000",
        })),
        Map::new(),
    ]);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].job_type, JobType::PartTime);
    assert_eq!(records[0].experience, "2 years");
    assert_eq!(records[0].deadline.to_rfc3339(), "2025-12-01T00:00:00+00:00");

    assert_eq!(records[1].title, "Untitled Position");
    assert_eq!(records[1].deadline - records[1].posted_date, TimeDelta::days(30));

    let filter = SalaryFilter::parse("70000-90000").unwrap();
    let matching: Vec<_> = records
        .iter()
        .filter(|r| r.salary_range().is_some_and(|s| filter.matches(&s)))
        .collect();
    assert_eq!(matching.len(), 1);
}

#[test]
fn test_record_json_shape() {
    let records = parser().parse_bulk(&[obj(json!({"title": "Cook"}))]);
    let value = serde_json::to_value(&records[0]).unwrap();
    let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        [
            "company",
            "deadline",
            "description",
            "experience",
            "location",
            "postedDate",
            "requirements",
            "salary",
            "title",
            "type",
        ]
    );
}

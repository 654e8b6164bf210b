use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::directory::domain::{Program, Resource};
use crate::newsletter::domain::Recipient;

/// A rendered CSV download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: &'static str,
    pub content: Vec<u8>,
}

#[derive(Serialize)]
struct ProgramRow<'a> {
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "City")]
    city: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "Last Published At")]
    last_published_at: String,
}

#[derive(Serialize)]
struct ResourceRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Author")]
    author: &'a str,
    #[serde(rename = "Age Group")]
    age_group: &'a str,
}

#[derive(Serialize)]
struct RecipientRow<'a> {
    email: &'a str,
    active: bool,
    created: String,
    modified: String,
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

pub fn programs_csv(programs: &[Program]) -> Result<ExportFile, csv::Error> {
    let rows = programs.iter().map(|program| ProgramRow {
        title: &program.title,
        city: program.profile.city.as_deref().unwrap_or_default(),
        status: program.status_label(),
        last_published_at: program
            .last_published_at
            .as_ref()
            .map(timestamp)
            .unwrap_or_default(),
    });
    Ok(ExportFile {
        filename: "programs_list_export.csv",
        content: write_rows(rows)?,
    })
}

pub fn resources_csv(resources: &[Resource]) -> Result<ExportFile, csv::Error> {
    let rows = resources.iter().map(|resource| ResourceRow {
        name: &resource.name,
        author: &resource.author,
        age_group: &resource.age_group,
    });
    Ok(ExportFile {
        filename: "resource_list_export.csv",
        content: write_rows(rows)?,
    })
}

pub fn recipients_csv(recipients: &[Recipient]) -> Result<ExportFile, csv::Error> {
    let rows = recipients.iter().map(|recipient| RecipientRow {
        email: &recipient.email,
        active: recipient.active,
        created: timestamp(&recipient.created),
        modified: timestamp(&recipient.modified),
    });
    Ok(ExportFile {
        filename: "newsletter_recipients_export.csv",
        content: write_rows(rows)?,
    })
}

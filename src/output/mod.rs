//! Result writers: JSON document and flat CSV table.
//!
//! Thin I/O adapters over the final place list; the pipeline itself never
//! touches disk.

use crate::pipeline::aggregate::Place;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write the full place list as pretty-printed JSON.
pub fn write_json(places: &[Place], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), places).context("serializing places")?;
    Ok(())
}

/// Write a flat CSV view: one row per place, multi-valued fields joined
/// with `;`. Raw tags are left to the JSON output.
pub fn write_csv(places: &[Place], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer.write_record([
        "id",
        "name",
        "lat",
        "lon",
        "kind",
        "category",
        "phone",
        "website",
        "address_city",
        "address_street",
        "emails",
        "social_links",
        "meta_description",
        "enrichment_error",
    ])?;

    for place in places {
        let social_links = place
            .social_links
            .iter()
            .map(|(network, link)| format!("{network}={link}"))
            .collect::<Vec<_>>()
            .join(";");
        writer.write_record([
            place.id.to_string(),
            place.name.clone(),
            place.lat.to_string(),
            place.lon.to_string(),
            place.kind.as_str().to_string(),
            place.category.clone(),
            place.phone.clone().unwrap_or_default(),
            place.website.clone().unwrap_or_default(),
            place.address_city.clone().unwrap_or_default(),
            place.address_street.clone().unwrap_or_default(),
            place.extracted_emails.join(";"),
            social_links,
            place.meta_description.clone().unwrap_or_default(),
            place.enrichment_error.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush().context("flushing csv")?;
    Ok(())
}

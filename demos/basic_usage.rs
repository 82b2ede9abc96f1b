//! Basic usage example for popatlas-rs
//!
//! This example demonstrates how to:
//! - Plug a custom `DataSource` into the orchestrator (no network needed)
//! - Load a year and assemble the map view
//! - Read buckets, tooltips and the top-N table
//! - Load a demographic pyramid on demand

use popatlas_rs::prelude::*;
use serde_json::{json, Value};

/// A tiny in-memory dataset standing in for the UNHCR API.
struct Inline;

impl DataSource for Inline {
    async fn statistics(&self, year: i32, scope: Scope) -> Result<Value> {
        Ok(match scope {
            Scope::Asylum => json!({ "items": [
                { "coa_iso": "TUR", "coa_name": "Türkiye", "year": year, "refugees": 3200000 },
                { "coa_iso": "DEU", "coa_name": "Germany", "year": year, "refugees": 2600000 },
                { "coa_iso": "SYR", "coa_name": "Syrian Arab Rep.", "year": year, "refugees": 15000 }
            ]}),
            Scope::Origin => json!({ "items": [
                { "coo_iso": "SYR", "coo_name": "Syrian Arab Rep.", "year": year, "refugees": 6300000 },
                { "coo_iso": "-", "coo_name": "Stateless", "year": year, "refugees": 4000 }
            ]}),
        })
    }

    async fn demographics(&self, _year: i32, _origin_code: &str) -> Result<Value> {
        Ok(json!({ "items": [{
            "f_0_4": 310000, "f_5_11": 520000, "f_12_17": 330000, "f_18_59": 1350000, "f_60": 120000,
            "m_0_4": 320000, "m_5_11": 540000, "m_12_17": 350000, "m_18_59": 1280000, "m_60": 100000
        }]}))
    }

    async fn geography(&self) -> Result<Value> {
        Ok(json!({ "type": "FeatureCollection", "features": [
            { "id": "TUR", "properties": { "name": "Turkey" }, "geometry": null },
            { "id": "DEU", "properties": { "name": "Germany" }, "geometry": null },
            { "id": "SYR", "properties": { "name": "Syria" }, "geometry": null },
            { "id": "GRL", "properties": { "name": "Greenland" }, "geometry": null }
        ]}))
    }
}

fn main() -> Result<()> {
    println!("=== popatlas-rs Basic Usage Example ===\n");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        let config = AtlasConfig::default();
        let mut orch = Orchestrator::new(Inline, &config);

        // Example 1: load a year
        println!("--- Example 1: Load 2024 ---");
        let state = orch.load_year(2024).await;
        println!("State: {state}\n");

        // Example 2: buckets and tooltips
        println!("--- Example 2: Buckets and tooltips ---");
        let mut assembler = Assembler::new(config.alias_table(), config.bucket_count);
        let view = assembler.assemble(orch.session())?;
        for feature in view.features() {
            for scope in Scope::ALL {
                let class = match view.style_for(scope, feature.id) {
                    Classification::Bucket(b) => format!("bucket {b}"),
                    Classification::NoData => "no-data".to_string(),
                };
                if let Some(tooltip) = view.tooltip_for(scope, feature.id) {
                    println!("[{scope} / {class}] {}", tooltip.label(scope).replace('\n', " | "));
                }
            }
        }
        println!();

        // Example 3: top-N
        println!("--- Example 3: Top host countries ---");
        for entry in view.top_n(Scope::Asylum, 3) {
            println!("{}. {} ({})", entry.rank, entry.record.name(), entry.record.count);
        }
        println!();

        // Example 4: demographics on demand
        println!("--- Example 4: Age/sex pyramid for Syria ---");
        let pyramid = orch.load_demographics("SYR").await?;
        for band in &pyramid.bands {
            println!(
                "{:>6}  F {:>5.1}%  M {:>5.1}%",
                band.age_band.label(),
                100.0 * pyramid.proportion(band.female_count),
                100.0 * pyramid.proportion(band.male_count)
            );
        }

        println!("\n✓ Done");
        Ok::<(), AtlasError>(())
    })
}

use anyhow::{Context, Result};
use tracing::{error, info};

use carte_common::Config;
use carte_core::render::render_error_page;
use carte_core::{build_map, source_for};

pub async fn run(config: &Config) -> Result<()> {
    let source = source_for(&config.data);
    let mut geocoder = super::geocoder(config);

    tokio::fs::create_dir_all(&config.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.out_dir.display()))?;
    let index_path = config.out_dir.join("index.html");

    let map = match build_map(source.as_ref(), &mut geocoder).await {
        Ok(map) => map,
        Err(e) => {
            error!(error = %e, "Failed to load datasets");
            tokio::fs::write(&index_path, render_error_page(&e.to_string())).await?;
            return Err(e.into());
        }
    };

    tokio::fs::write(&index_path, map.html()).await?;
    let geojson_path = config.out_dir.join("markers.geojson");
    tokio::fs::write(&geojson_path, serde_json::to_vec_pretty(&map.geojson())?).await?;

    info!(
        index = %index_path.display(),
        geojson = %geojson_path.display(),
        markers = map.layers.marker_count(),
        skipped = map.layers.skipped.len(),
        cached = geocoder.cache().len(),
        "Map written"
    );
    Ok(())
}

use anyhow::Context;
use branch_locator::adapters::file;
use branch_locator::core::geodesy;
use branch_locator::utils::error::ErrorSeverity;
use branch_locator::utils::{logger, validation};
use branch_locator::utils::validation::Validate;
use branch_locator::{
    BoundingBox, BranchQuery, BranchRepository, BranchStore, CachedBranchStore, CliConfig,
    Command, EngineConfig, GeoPoint, InMemoryBranchStore, LocatorError, StatusFilter,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting branch-locator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(&cli).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            let locator_error = match e.downcast_ref::<LocatorError>() {
                Some(err) => err,
                None => return Err(e),
            };

            tracing::error!(
                "Query failed: {:#} (Category: {:?}, Severity: {:?})",
                e,
                locator_error.category(),
                locator_error.severity()
            );
            eprintln!("❌ {}", locator_error.user_friendly_message());
            eprintln!("💡 {}", locator_error.recovery_suggestion());

            let exit_code = match locator_error.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &CliConfig) -> anyhow::Result<String> {
    cli.validate()?;

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading engine config from {}", path))?,
        None => EngineConfig::default(),
    };
    if cli.bearing {
        config.search.include_bearing = true;
    }
    config.validate()?;

    if let Command::Distance {
        from_lat,
        from_lon,
        to_lat,
        to_lon,
    } = cli.command
    {
        let from = GeoPoint::new(from_lat, from_lon)?;
        let to = GeoPoint::new(to_lat, to_lon)?;
        let output = serde_json::json!({
            "from": from,
            "to": to,
            "distance_km": geodesy::distance_km(from, to),
            "distance_meters": geodesy::distance_meters(from, to),
            "bearing_degrees": geodesy::bearing_degrees(from, to),
        });
        return Ok(serde_json::to_string_pretty(&output)?);
    }

    let data = cli.data.clone().or_else(|| config.data_path().map(str::to_string));
    let data_path = validation::validate_required_field("data", &data)?;
    let branches = file::load_branches(data_path)
        .with_context(|| format!("reading branch data from {}", data_path))?;
    let store = InMemoryBranchStore::from_branches(branches)?;

    let status = if cli.status.is_empty() {
        StatusFilter::active_only()
    } else {
        StatusFilter::one_of(cli.status.iter().copied())
    };

    if config.cache_enabled() {
        tracing::debug!("Snapshot cache enabled");
        let repository = BranchRepository::new(CachedBranchStore::new(store), config);
        execute(&repository, &cli.command, &status).await
    } else {
        let repository = BranchRepository::new(store, config);
        execute(&repository, &cli.command, &status).await
    }
}

async fn execute<S: BranchStore>(
    repository: &BranchRepository<S, EngineConfig>,
    command: &Command,
    status: &StatusFilter,
) -> anyhow::Result<String> {
    let output = match command {
        Command::Nearest {
            lat,
            lon,
            limit,
            types,
        } => {
            let origin = GeoPoint::new(*lat, *lon)?;
            let results = if types.is_empty() {
                repository
                    .find_nearest_branches_with_status(origin, *limit, status)
                    .await?
            } else {
                let types = types.iter().copied().collect();
                repository
                    .find_nearest_branches_by_types_with_status(origin, &types, *limit, status)
                    .await?
            };
            tracing::info!("Found {} branches near {}", results.len(), origin);
            serde_json::to_string_pretty(&results)?
        }
        Command::Radius {
            lat,
            lon,
            radius_km,
            types,
            limit,
        } => {
            let origin = GeoPoint::new(*lat, *lon)?;
            let mut query = BranchQuery::new(origin, *limit)
                .with_radius(*radius_km)
                .with_status_filter(status.clone());
            if !types.is_empty() {
                query = query.with_types(types.iter().copied());
            }
            let results = repository.search(&query).await?;
            tracing::info!(
                "Found {} branches within {} km of {}",
                results.len(),
                radius_km,
                origin
            );
            serde_json::to_string_pretty(&results)?
        }
        Command::Box {
            ne_lat,
            ne_lon,
            sw_lat,
            sw_lon,
        } => {
            let bounding_box = BoundingBox::new(
                GeoPoint::new(*ne_lat, *ne_lon)?,
                GeoPoint::new(*sw_lat, *sw_lon)?,
            )?;
            let branches = repository
                .find_in_bounding_box_with_status(bounding_box, status)
                .await?;
            tracing::info!("Found {} branches in bounding box", branches.len());
            serde_json::to_string_pretty(&branches)?
        }
        Command::Distance { .. } => unreachable!("distance is answered without branch data"),
    };
    Ok(output)
}

// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use anyhow::{Context, Result};
use clap::Parser;
use geo_types::{Coord, MultiPoint, Point};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use pathfinder::snapshot::{load_snapshot, save_snapshot};
use pathfinder::vertex_key::round_coord;
use pathfinder::{PathFinder, PathFinderOptions};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Path finding over GeoJSON line networks", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum HullKind {
    Convex,
    Concave,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Preprocess and compact a GeoJSON network into a binary snapshot
    Build {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// RON file with path finder options
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Shortest path between two points, printed as a GeoJSON feature
    Route {
        /// GeoJSON network or .bin snapshot
        #[arg(short, long)]
        graph: PathBuf,
        #[arg(long)]
        options: Option<PathBuf>,
        /// Start as lon,lat
        #[arg(long, value_parser = parse_coord)]
        from: Coord<f64>,
        /// Finish as lon,lat
        #[arg(long, value_parser = parse_coord)]
        to: Coord<f64>,
    },
    /// Points reachable within a cost, optionally as a hull polygon
    Isochrone {
        #[arg(short, long)]
        graph: PathBuf,
        #[arg(long)]
        options: Option<PathBuf>,
        #[arg(long, value_parser = parse_coord)]
        from: Coord<f64>,
        #[arg(long)]
        cost: f64,
        #[arg(long, value_enum)]
        hull: Option<HullKind>,
        #[arg(long, default_value_t = 2.0)]
        concavity: f64,
    },
    /// Closest junction to a point
    Nearest {
        #[arg(short, long)]
        graph: PathBuf,
        #[arg(long)]
        options: Option<PathBuf>,
        #[arg(long, value_parser = parse_coord)]
        at: Coord<f64>,
    },
}

fn parse_coord(s: &str) -> Result<Coord<f64>, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lon,lat, got '{}'", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Coord { x, y })
}

fn load_options(path: Option<&Path>) -> Result<PathFinderOptions> {
    match path {
        Some(path) => PathFinderOptions::from_ron_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display())),
        None => Ok(PathFinderOptions::default()),
    }
}

fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let geojson: GeoJson = contents.parse().context("Invalid GeoJSON")?;
    FeatureCollection::try_from(geojson).context("GeoJSON is not a FeatureCollection")
}

fn load_finder(graph: &Path, options: Option<&Path>) -> Result<PathFinder> {
    if graph.extension().is_some_and(|ext| ext == "bin") {
        let snapshot = load_snapshot(graph)?;
        return Ok(PathFinder::from_snapshot(snapshot)?);
    }

    let options = load_options(options)?;
    let collection = read_collection(graph)?;
    Ok(PathFinder::from_geojson(&collection, &options)?)
}

fn print_geojson(geojson: GeoJson) -> Result<()> {
    println!("{}", serde_json::to_string(&geojson)?);
    Ok(())
}

fn feature(geometry: Value, properties: JsonObject) -> GeoJson {
    GeoJson::Feature(Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    match args.command {
        Commands::Build {
            input,
            output,
            options,
        } => {
            let options = load_options(options.as_deref())?;
            let collection = read_collection(&input)?;
            let finder = PathFinder::from_geojson(&collection, &options)?;
            info!(
                "Compacted {} vertices to {} junctions",
                finder.vertex_count(),
                finder.junction_count()
            );
            save_snapshot(&finder.serialize(), &output)?;
        }
        Commands::Route {
            graph,
            options,
            from,
            to,
        } => {
            let mut finder = load_finder(&graph, options.as_deref())?;
            let Some(result) = finder.find_path(from, to) else {
                anyhow::bail!("No path between {:?} and {:?}", from, to);
            };

            // Endpoints as the graph sees them, after rounding onto the vertex grid.
            let from = round_coord(from, finder.precision());
            let to = round_coord(to, finder.precision());

            let mut properties = JsonObject::new();
            properties.insert("weight".to_string(), result.weight.into());
            properties.insert("from".to_string(), vec![from.x, from.y].into());
            properties.insert("to".to_string(), vec![to.x, to.y].into());
            if let Some(ids) = &result.edge_ids {
                let ids: Vec<u32> = ids.iter().map(|id| id.0).collect();
                properties.insert("edge_ids".to_string(), ids.into());
            }
            let line = result.path.iter().map(|c| vec![c.x, c.y]).collect();
            print_geojson(feature(Value::LineString(line), properties))?;
        }
        Commands::Isochrone {
            graph,
            options,
            from,
            cost,
            hull,
            concavity,
        } => {
            let mut finder = load_finder(&graph, options.as_deref())?;
            let mut properties = JsonObject::new();
            properties.insert("cost".to_string(), cost.into());

            let geometry = match hull {
                None => {
                    let Some(points) = finder.reachable_points(from, cost) else {
                        anyhow::bail!("{:?} is not a vertex of the network", from);
                    };
                    let points: MultiPoint<f64> = points.into_iter().map(Point::from).collect();
                    Value::from(&points)
                }
                Some(kind) => {
                    let polygon = match kind {
                        HullKind::Convex => finder.isochrone_convex_hull(from, cost),
                        HullKind::Concave => finder.isochrone_concave_hull(from, cost, concavity),
                    };
                    let Some(polygon) = polygon else {
                        anyhow::bail!("Too few reachable points around {:?} for a hull", from);
                    };
                    Value::from(&polygon)
                }
            };
            print_geojson(feature(geometry, properties))?;
        }
        Commands::Nearest { graph, options, at } => {
            let finder = load_finder(&graph, options.as_deref())?;
            let Some((junction, distance)) = finder.nearest_junction(at) else {
                anyhow::bail!("Network has no junctions");
            };
            let mut properties = JsonObject::new();
            properties.insert("distance_m".to_string(), distance.into());
            print_geojson(feature(Value::Point(vec![junction.x, junction.y]), properties))?;
        }
    }

    Ok(())
}

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use catalog_api::{CatalogContext, RatingThresholds};
use clap::{Parser, Subcommand};
use feed_api::{validation::parse_reaction_type, FeedContext};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{CommentId, GroupId, PostId, UserId},
    error::{ApiError, CatalogError},
    protocol::{
        ActorActivity, CatalogSeed, MovieActorCount, MovieDetails, MovieGenderCount,
        MovieRolesCount, RoleFrequency,
    },
};
use storage::Storage;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(name = "tools", about = "Feed and movie catalog commands over one SQLite database")]
struct Cli {
    /// Config file; defaults to ./tools.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured database url.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateUser {
        name: String,
        #[arg(long, default_value = "")]
        profile_pic: String,
    },
    CreatePost {
        user_id: i64,
        content: String,
        #[arg(long)]
        group_id: Option<i64>,
    },
    Comment {
        user_id: i64,
        post_id: i64,
        content: String,
    },
    Reply {
        user_id: i64,
        comment_id: i64,
        content: String,
    },
    ReactPost {
        user_id: i64,
        post_id: i64,
        reaction: String,
    },
    ReactComment {
        user_id: i64,
        comment_id: i64,
        reaction: String,
    },
    DeletePost {
        user_id: i64,
        post_id: i64,
    },
    ShowPost {
        post_id: i64,
    },
    UserPosts {
        user_id: i64,
    },
    CreateGroup {
        user_id: i64,
        name: String,
        /// Comma separated member ids.
        #[arg(long = "members", value_delimiter = ',')]
        members: Vec<i64>,
    },
    AddMember {
        user_id: i64,
        member_id: i64,
        group_id: i64,
    },
    RemoveMember {
        user_id: i64,
        member_id: i64,
        group_id: i64,
    },
    MakeAdmin {
        user_id: i64,
        member_id: i64,
        group_id: i64,
    },
    GroupFeed {
        user_id: i64,
        group_id: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Loads actors, directors, movies, cast and ratings from a JSON seed file.
    PopulateCatalog {
        seed: PathBuf,
    },
    MovieDetails {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Prints catalog aggregates plus the per-year reports for `--year`.
    CatalogReport {
        #[arg(long, default_value_t = 2000)]
        year: i32,
        #[arg(long, default_value_t = 5)]
        min_female_cast: i64,
    },
}

#[derive(Debug, Serialize)]
struct CatalogReport {
    average_box_office_collection: f64,
    average_no_of_actors: f64,
    movies_with_distinct_actors_count: Vec<MovieActorCount>,
    male_and_female_actors_count: Vec<MovieGenderCount>,
    roles_count_for_each_movie: Vec<MovieRolesCount>,
    role_frequency_in_order: Vec<RoleFrequency>,
    actor_activity: Vec<ActorActivity>,
    directors_in_year: Vec<String>,
    movies_rated_above_minimum: Vec<String>,
    female_cast_details: Vec<MovieDetails>,
}

type Outcome = std::result::Result<Value, ApiError>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    let settings = config::load_settings(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let database_url =
        config::prepare_database_url(cli.database_url.as_deref().unwrap_or(&settings.database_url));
    let storage = open_storage(&database_url).await?;
    let feed = FeedContext::new(storage.clone());
    let catalog = CatalogContext::new(storage);

    match run(cli.command, &feed, &catalog).await? {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            warn!(kind = %err.kind, "command rejected");
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn open_storage(database_url: &str) -> Result<Storage> {
    debug!(%database_url, "opening storage");
    let storage = Storage::new(database_url).await?;
    storage
        .health_check()
        .await
        .with_context(|| format!("database '{database_url}' is not usable"))?;
    Ok(storage)
}

fn outcome<T: Serialize, E: Into<ApiError>>(result: std::result::Result<T, E>) -> Result<Outcome> {
    match result {
        Ok(value) => Ok(Ok(serde_json::to_value(value)?)),
        Err(err) => Ok(Err(err.into())),
    }
}

async fn run(command: Command, feed: &FeedContext, catalog: &CatalogContext) -> Result<Outcome> {
    match command {
        Command::CreateUser { name, profile_pic } => {
            outcome(feed_api::create_user(feed, &name, &profile_pic).await)
        }
        Command::CreatePost {
            user_id,
            content,
            group_id,
        } => outcome(
            feed_api::create_post(feed, UserId(user_id), &content, group_id.map(GroupId)).await,
        ),
        Command::Comment {
            user_id,
            post_id,
            content,
        } => outcome(
            feed_api::create_comment(feed, UserId(user_id), PostId(post_id), &content).await,
        ),
        Command::Reply {
            user_id,
            comment_id,
            content,
        } => outcome(
            feed_api::reply_to_comment(feed, UserId(user_id), CommentId(comment_id), &content)
                .await,
        ),
        Command::ReactPost {
            user_id,
            post_id,
            reaction,
        } => {
            let reaction = match parse_reaction_type(&reaction) {
                Ok(reaction) => reaction,
                Err(err) => return outcome::<(), _>(Err(err)),
            };
            outcome(feed_api::react_to_post(feed, UserId(user_id), PostId(post_id), reaction).await)
        }
        Command::ReactComment {
            user_id,
            comment_id,
            reaction,
        } => {
            let reaction = match parse_reaction_type(&reaction) {
                Ok(reaction) => reaction,
                Err(err) => return outcome::<(), _>(Err(err)),
            };
            outcome(
                feed_api::react_to_comment(feed, UserId(user_id), CommentId(comment_id), reaction)
                    .await,
            )
        }
        Command::DeletePost { user_id, post_id } => {
            outcome(feed_api::delete_post(feed, UserId(user_id), PostId(post_id)).await)
        }
        Command::ShowPost { post_id } => outcome(feed_api::get_post(feed, PostId(post_id)).await),
        Command::UserPosts { user_id } => {
            outcome(feed_api::get_user_posts(feed, UserId(user_id)).await)
        }
        Command::CreateGroup {
            user_id,
            name,
            members,
        } => {
            let members: Vec<UserId> = members.into_iter().map(UserId).collect();
            outcome(feed_api::create_group(feed, UserId(user_id), &name, &members).await)
        }
        Command::AddMember {
            user_id,
            member_id,
            group_id,
        } => outcome(
            feed_api::add_member_to_group(
                feed,
                UserId(user_id),
                UserId(member_id),
                GroupId(group_id),
            )
            .await,
        ),
        Command::RemoveMember {
            user_id,
            member_id,
            group_id,
        } => outcome(
            feed_api::remove_member_from_group(
                feed,
                UserId(user_id),
                UserId(member_id),
                GroupId(group_id),
            )
            .await,
        ),
        Command::MakeAdmin {
            user_id,
            member_id,
            group_id,
        } => outcome(
            feed_api::make_member_as_admin(
                feed,
                UserId(user_id),
                UserId(member_id),
                GroupId(group_id),
            )
            .await,
        ),
        Command::GroupFeed {
            user_id,
            group_id,
            offset,
            limit,
        } => outcome(
            feed_api::get_group_feed(feed, UserId(user_id), GroupId(group_id), offset, limit).await,
        ),
        Command::PopulateCatalog { seed } => {
            let raw = fs::read_to_string(&seed)
                .with_context(|| format!("failed to read seed file '{}'", seed.display()))?;
            let seed: CatalogSeed = serde_json::from_str(&raw)
                .with_context(|| format!("invalid seed file '{}'", seed.display()))?;
            outcome(catalog_api::populate_database(catalog, &seed).await)
        }
        Command::MovieDetails { names } => {
            outcome(catalog_api::get_movies_by_given_movie_names(catalog, &names).await)
        }
        Command::CatalogReport {
            year,
            min_female_cast,
        } => outcome(catalog_report(catalog, year, min_female_cast).await),
    }
}

async fn catalog_report(
    ctx: &CatalogContext,
    year: i32,
    min_female_cast: i64,
) -> std::result::Result<CatalogReport, CatalogError> {
    let thresholds = RatingThresholds {
        released_after_year: year,
        ..RatingThresholds::default()
    };
    Ok(CatalogReport {
        average_box_office_collection: catalog_api::get_average_box_office_collections(ctx).await?,
        average_no_of_actors: catalog_api::get_average_no_of_actors_for_all_movies(ctx).await?,
        movies_with_distinct_actors_count: catalog_api::get_movies_with_distinct_actors_count(ctx)
            .await?,
        male_and_female_actors_count: catalog_api::get_male_and_female_actors_count_for_each_movie(
            ctx,
        )
        .await?,
        roles_count_for_each_movie: catalog_api::get_roles_count_for_each_movie(ctx).await?,
        role_frequency_in_order: catalog_api::get_role_frequency_in_order(ctx).await?,
        actor_activity: catalog_api::get_no_of_movies_and_distinct_roles_for_each_actor(ctx).await?,
        directors_in_year: catalog_api::get_movie_directors_in_given_year(ctx, year).await?,
        movies_rated_above_minimum: catalog_api::get_movie_names_with_ratings_above_given_minimum(
            ctx,
            &thresholds,
        )
        .await?,
        female_cast_details: catalog_api::get_female_cast_details_from_movies_having_more_than(
            ctx,
            min_female_cast,
        )
        .await?,
    })
}

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use dashsync_core::SearchParams;

use crate::config::ConfigLayer;

#[derive(Parser, Debug)]
#[command(name = "dashsync")]
#[command(author, version, about = "Sync dashboards and folders with a dashboard server", long_about = None)]
pub struct Cli {
    /// Base URL of the server (e.g. https://grafana.example.com)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// API key, or `user:password` for basic auth
    #[arg(long, global = true)]
    pub apikey: Option<String>,

    /// Config file (default: ./.dashsync.yaml, then ~/.dashsync.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn flag_layer(&self) -> ConfigLayer {
        ConfigLayer {
            url: self.url.clone(),
            apikey: self.apikey.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download folders and dashboards into local directories
    Download {
        /// Download all dashboards
        #[arg(short = 'a', long = "all")]
        all: bool,

        /// Target directory to save dashboard files
        #[arg(short = 't', long = "target", default_value = ".")]
        target: PathBuf,
    },

    /// Upload dashboard files, recreating folders from their signatures
    ///
    /// Only files with a '.json' extension are uploaded.
    Upload {
        /// Dashboard file, folder directory, or download root
        #[arg(short = 'f', long = "files", default_value = ".")]
        files: PathBuf,

        /// Overwrite dashboards that changed on the server
        #[arg(long)]
        overwrite: bool,
    },

    /// Folder operations
    Folder {
        #[command(subcommand)]
        command: FolderCommand,
    },

    /// Dashboard operations
    Dashboard {
        #[command(subcommand)]
        command: DashboardCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum FolderCommand {
    /// List folders
    List,
}

#[derive(Subcommand, Debug)]
pub enum DashboardCommand {
    /// List dashboards
    List,
    /// Search for dashboards
    Search(SearchArgs),
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Search words, used when --query is not given
    #[arg(value_name = "QUERY")]
    pub words: Vec<String>,

    /// Search query
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// Tags to search for
    #[arg(short = 't', long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Dashboard ids to search for
    #[arg(short = 'd', long = "dashboard-id", value_delimiter = ',')]
    pub dashboard_ids: Vec<i64>,

    /// Folder ids to search in
    #[arg(short = 'f', long = "folder-id", value_delimiter = ',')]
    pub folder_ids: Vec<i64>,

    /// Only starred dashboards
    #[arg(long)]
    pub starred: bool,
}

impl SearchArgs {
    pub fn to_params(&self) -> SearchParams {
        let positional = (!self.words.is_empty()).then(|| self.words.join(" "));
        SearchParams {
            query: self
                .query
                .clone()
                .filter(|query| !query.is_empty())
                .or(positional),
            tags: self.tags.clone(),
            dashboard_ids: self.dashboard_ids.clone(),
            folder_ids: self.folder_ids.clone(),
            starred: self.starred,
            search_type: None,
        }
    }
}

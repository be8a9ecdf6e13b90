pub mod task;

pub use task::{
    affinity_mask, display_path, LaunchDescriptor, LaunchedProcess, Spawner, SystemSpawner,
};

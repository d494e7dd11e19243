/// Macro to register scenes with automatic constructor generation
///
/// Usage in scenes/mod.rs:
/// ```ignore
/// register_scenes! {
///     weather => {
///         scene: WeatherScene,
///         key: "weather",
///         name: "Weather Visualizer",
///         description: "Particle effects driven by the latest reading"
///     }
/// }
/// ```
/// Every scene type needs an inherent `fn new(config: &AppConfig) -> Self`.
#[macro_export]
macro_rules! register_scenes {
    (
        $(
            $module:ident => {
                scene: $scene:ident,
                key: $key:expr,
                name: $name:expr,
                description: $desc:expr
            }
        ),* $(,)?
    ) => {
        /// Metadata of every registered scene, in registration order
        pub fn scene_infos() -> Vec<SceneInfo> {
            vec![
                $(
                    SceneInfo {
                        key: $key,
                        name: $name,
                        description: $desc,
                    }
                ),*
            ]
        }

        /// Build every registered scene from the given config
        pub fn all_scenes(config: &$crate::config::AppConfig) -> Vec<SceneEntry> {
            vec![
                $(
                    SceneEntry {
                        info: SceneInfo {
                            key: $key,
                            name: $name,
                            description: $desc,
                        },
                        scene: std::sync::Arc::new($crate::scenes::$module::$scene::new(config)),
                    }
                ),*
            ]
        }

        /// Build a single scene by key
        pub fn find_scene(key: &str, config: &$crate::config::AppConfig) -> Option<SceneEntry> {
            all_scenes(config).into_iter().find(|s| s.info.key == key)
        }
    };
}

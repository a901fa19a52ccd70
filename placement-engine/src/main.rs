use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy_common_assets::json::JsonAssetPlugin;

mod placement;
mod rpc;
mod scene;
mod tracking;

use placement::{PlaceableCatalog, PlacementPlugin};
use rpc::WebRpcPlugin;
use scene::ScenePlugin;
use tracking::TrackingPlugin;

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        // Registers the placeable catalog as a loadable JSON asset type.
        .add_plugins(JsonAssetPlugin::<PlaceableCatalog>::new(&["json"]))
        .add_plugins(TrackingPlugin::default())
        .add_plugins(PlacementPlugin)
        .add_plugins(ScenePlugin)
        .add_plugins(WebRpcPlugin);

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some("#bevy".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "AR Surface Placement".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}

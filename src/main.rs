use std::sync::Arc;

use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::{AppHandle, Manager, RunEvent};
use tokio::sync::mpsc;

use gmail_checker::{
    build_tray_menu, init_store_manager, Alarm, AuthPollController, BadgeState, Notification,
    NotificationId, ReqwestClient, StoreManager, TauriSurface, TrayIconRenderer,
    WebviewTokenIssuer, MENU_OPEN, MENU_QUIT, MENU_REFRESH, POLL_ALARM, TRAY_ID,
};

// ============================================================================
// Managed State
// ============================================================================

struct ControllerState {
    controller: Arc<AuthPollController>,
}

/// Dropping the sender stops the alarm, so it lives as long as the app.
struct AlarmState {
    _cancel: mpsc::Sender<()>,
}

fn controller(app: &AppHandle) -> Option<Arc<AuthPollController>> {
    app.try_state::<ControllerState>()
        .map(|state| Arc::clone(&state.controller))
}

/// Each trigger runs as its own task so overlapping triggers stay independent.
fn dispatch<F, Fut>(app: &AppHandle, handler: F)
where
    F: FnOnce(Arc<AuthPollController>) -> Fut,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    match controller(app) {
        Some(controller) => {
            tauri::async_runtime::spawn(handler(controller));
        }
        None => log::warn!("Trigger received before controller was ready"),
    }
}

fn on_menu_event(app: &AppHandle, id: &str) {
    match id {
        MENU_QUIT => app.exit(0),
        MENU_OPEN => dispatch(app, |c| async move { c.on_user_activation().await }),
        MENU_REFRESH => dispatch(app, |c| async move { c.on_manual_refresh().await }),
        other => match other.parse::<NotificationId>() {
            Ok(notification_id) => dispatch(app, move |c| async move {
                c.on_notification_activation(notification_id).await
            }),
            Err(e) => log::warn!("{}", e),
        },
    }
}

// ============================================================================
// Main Application
// ============================================================================

fn main() {
    // Initialize logger
    env_logger::init();

    let app = tauri::Builder::default()
        // Register plugins
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_opener::init())
        // Setup application
        .setup(|app| {
            log::info!("Initializing Gmail Checker");

            let app_handle = app.handle().clone();
            init_store_manager(&app_handle)?;

            let renderer = TrayIconRenderer::default();
            let initial_image = renderer
                .render_badge(&BadgeState::unauthenticated(), 16)?
                .into_tauri_image();
            let menu = build_tray_menu(&app_handle, std::iter::empty::<&Notification>())?;

            #[allow(deprecated)]
            TrayIconBuilder::with_id(TRAY_ID)
                .icon(initial_image)
                .menu(&menu)
                .menu_on_left_click(false)
                .tooltip(BadgeState::unauthenticated().tooltip)
                .on_menu_event(|app, event| on_menu_event(app, event.id.as_ref()))
                .on_tray_icon_event(|tray, event| {
                    if let TrayIconEvent::Click {
                        button: MouseButton::Left,
                        button_state: MouseButtonState::Up,
                        ..
                    } = event
                    {
                        dispatch(tray.app_handle(), |c| async move {
                            c.on_user_activation().await
                        });
                    }
                })
                .build(app)?;

            let store = app.state::<StoreManager>();
            let controller = Arc::new(AuthPollController::new(
                Arc::new(WebviewTokenIssuer::new(app_handle.clone())),
                Arc::new(ReqwestClient::new()),
                Arc::new(TauriSurface::new(app_handle.clone(), renderer)),
                store.endpoints(),
            ));
            app.manage(ControllerState {
                controller: Arc::clone(&controller),
            });

            // Arm the polling alarm
            let (cancel_tx, cancel_rx) = mpsc::channel(1);
            let alarm = Alarm::periodic(POLL_ALARM, store.poll_interval());
            let tick_handle = app_handle.clone();
            tauri::async_runtime::spawn(alarm.run(cancel_rx, move |name| {
                let name = name.to_string();
                dispatch(&tick_handle, move |c| async move {
                    c.on_scheduled_tick(&name).await
                });
            }));
            app.manage(AlarmState { _cancel: cancel_tx });

            tauri::async_runtime::spawn(async move { controller.on_startup().await });

            log::info!("Gmail Checker initialized");
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri app");

    app.run(|_app, event| {
        // Closing the auth window must not end a tray-only app.
        if let RunEvent::ExitRequested { api, code, .. } = event {
            if code.is_none() {
                api.prevent_exit();
            }
        }
    });
}

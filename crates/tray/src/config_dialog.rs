// Configuration window
//
// Modal form with the four credential fields; Save submits them back to
// the event loop verbatim.

use adw::prelude::*;
use gtk4::prelude::*;
use libadwaita as adw;
use tokio::sync::mpsc::UnboundedSender;

use tuya_tray_common::TuyaConfig;

use crate::events::AppEvent;

/// Present the configuration window pre-filled from the current config
pub fn present(current: &TuyaConfig, events: UnboundedSender<AppEvent>) {
    let window = adw::Window::builder()
        .modal(true)
        .default_width(420)
        .default_height(380)
        .title("Tuya Configuration")
        .build();

    // ESC closes the window
    {
        let window_clone = window.clone();
        let key_controller = gtk4::EventControllerKey::new();
        key_controller.connect_key_pressed(move |_controller, key, _code, _modifier| {
            if key == gtk4::gdk::Key::Escape {
                window_clone.close();
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        window.add_controller(key_controller);
    }

    let toolbar_view = adw::ToolbarView::new();

    let header = adw::HeaderBar::new();
    header.set_show_end_title_buttons(false);

    let cancel_button = gtk4::Button::builder().label("Cancel").build();
    let save_button = gtk4::Button::builder().label("Save").build();
    save_button.add_css_class("suggested-action");

    header.pack_start(&cancel_button);
    header.pack_end(&save_button);
    toolbar_view.add_top_bar(&header);

    let group = adw::PreferencesGroup::builder()
        .title("Cloud Credentials")
        .description("Project keys from the Tuya IoT platform")
        .build();

    let base_url_row = adw::EntryRow::new();
    base_url_row.set_title("Base URL");
    base_url_row.set_text(&current.base_url);

    let access_key_row = adw::EntryRow::new();
    access_key_row.set_title("Access Key");
    access_key_row.set_text(&current.access_key);

    let secret_key_row = adw::PasswordEntryRow::new();
    secret_key_row.set_title("Secret Key");
    secret_key_row.set_text(&current.secret_key);

    let user_id_row = adw::EntryRow::new();
    user_id_row.set_title("User ID");
    user_id_row.set_text(&current.user_id);

    group.add(&base_url_row);
    group.add(&access_key_row);
    group.add(&secret_key_row);
    group.add(&user_id_row);

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 24);
    content.set_margin_start(24);
    content.set_margin_end(24);
    content.set_margin_top(24);
    content.set_margin_bottom(24);
    content.append(&group);

    toolbar_view.set_content(Some(&content));
    window.set_content(Some(&toolbar_view));

    {
        let window_clone = window.clone();
        cancel_button.connect_clicked(move |_| {
            window_clone.close();
        });
    }

    {
        let window_clone = window.clone();
        save_button.connect_clicked(move |_| {
            // Values are submitted verbatim; completeness is checked where
            // the client is rebuilt
            let config = TuyaConfig {
                base_url: base_url_row.text().to_string(),
                access_key: access_key_row.text().to_string(),
                secret_key: secret_key_row.text().to_string(),
                user_id: user_id_row.text().to_string(),
            };
            let _ = events.send(AppEvent::ConfigSubmitted(config));
            window_clone.close();
        });
    }

    window.present();
}

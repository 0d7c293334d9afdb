//! The fixed bootstrap document every sandbox loads.
//!
//! The page reserves a container element for the widget, defines the global
//! ready hook the third-party embed API calls (forwarding the literal
//! `"ready"` to native code), loads the API script asynchronously, and exposes
//! a command dispatcher at [`DISPATCH_ENTRY_POINT`].

use serde_json::Value;
use tunebridge_bridge::config::EmbedConfig;

/// Global function the command encoder calls into.
pub const DISPATCH_ENTRY_POINT: &str = "window.tunebridge.apply";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no">
<title>Embedded Player</title>
<style>
  html, body { margin: 0; padding: 0; width: 100%; height: 100%; overflow: hidden; background-color: transparent; }
  #{{CONTAINER_ID}} { width: 100%; height: 100%; box-sizing: border-box; display: block; border: none; }
</style>
</head>
<body>
<div id="{{CONTAINER_ID}}"></div>
<script>
(() => {
  const handlerName = {{HANDLER_JSON}};
  const containerId = {{CONTAINER_JSON}};

  const post = (payload) => {
    const handler = window.webkit?.messageHandlers?.[handlerName];
    if (handler) { handler.postMessage(payload); return; }
    if (window.ipc?.postMessage) { window.ipc.postMessage(JSON.stringify(payload)); return; }
    console.error('Native message handler missing: ' + handlerName);
  };
  const report = (kind, message) => post({ event: 'error', data: { kind, message } });

  window[{{READY_HOOK_JSON}}] = (api) => {
    window.__embedApi = api;
    post('ready');
  };

  const bridge = {
    controller: null,
    createController(cmd) {
      const element = document.getElementById(containerId);
      if (!element) { report('controller_missing', 'HTML element ' + containerId + ' not found'); return; }
      if (!window.__embedApi) { report('controller_missing', 'Embed API not loaded'); return; }
      const options = { uri: cmd.uri, width: cmd.width, height: String(cmd.height) };
      try {
        window.__embedApi.createController(element, options, (controller) => {
          if (!controller) {
            post({ event: 'controllerCreated', data: { created: false, message: 'createController callback received null controller' } });
            return;
          }
          bridge.controller = controller;
          controller.addListener('playback_update', (e) => post({ event: 'playbackUpdate', data: e.data }));
          controller.addListener('account_error', (e) => report('account_error', 'Account Error: ' + (e.data?.message ?? 'Premium required or login issue?')));
          controller.addListener('autoplay_failed', () => report('autoplay_failed', 'Autoplay failed'));
          controller.addListener('initialization_error', (e) => report('initialization_error', 'Initialization Error: ' + (e.data?.message ?? 'Failed to initialize player')));
          post({ event: 'controllerCreated', data: { created: true } });
          if (cmd.autoplay) { controller.play(); }
        });
      } catch (e) {
        report('initialization_error', 'Initialization Error: createController threw: ' + e.message);
      }
    },
    loadUri(cmd) {
      const controller = bridge.controller;
      if (!controller) { report('controller_missing', 'Controller not found for loadUri operation'); return; }
      controller.loadUri(cmd.uri);
      if (cmd.autoplay) { setTimeout(() => controller.play(), cmd.autoplayDelayMs); }
    },
    play() { bridge.controller?.play(); },
    pause() { bridge.controller?.pause(); },
    scriptFailed() { report('script_load', 'Failed API script load'); },
  };

  const operations = ['createController', 'loadUri', 'play', 'pause'];
  window.tunebridge = {
    apply(cmd) {
      if (!cmd || !operations.includes(cmd.type)) { report('', 'Unknown command: ' + JSON.stringify(cmd)); return; }
      bridge[cmd.type](cmd);
    },
    scriptFailed: bridge.scriptFailed,
  };
})();
</script>
<script src="{{API_SCRIPT_URL}}" async onerror="window.tunebridge.scriptFailed()"></script>
</body>
</html>
"#;

/// Rendered bootstrap page plus the identifiers it reserves.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapDocument {
    html: String,
    container_id: String,
    message_handler: String,
}

impl BootstrapDocument {
    pub fn render(embed: &EmbedConfig) -> Self {
        let html = TEMPLATE
            .replace("{{CONTAINER_ID}}", &escape_attribute(&embed.container_id))
            .replace("{{CONTAINER_JSON}}", &js_string(&embed.container_id))
            .replace("{{HANDLER_JSON}}", &js_string(&embed.message_handler))
            .replace("{{READY_HOOK_JSON}}", &js_string(&embed.api_ready_hook))
            .replace("{{API_SCRIPT_URL}}", &escape_attribute(&embed.api_script_url));
        Self {
            html,
            container_id: embed.container_id.clone(),
            message_handler: embed.message_handler.clone(),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Id of the reserved element the creation command targets.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Name of the native handler the page posts messages to.
    pub fn message_handler(&self) -> &str {
        &self.message_handler
    }
}

/// JSON string literal that is also safe inside an inline `<script>`.
fn js_string(value: &str) -> String {
    Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

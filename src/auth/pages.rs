//! Static HTML served to the browser on the OAuth callback.

const SUCCESS_STYLE: &str = "\
  body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;\
         display: flex; justify-content: center; align-items: center;\
         height: 100vh; margin: 0;\
         background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); }\
  .container { background: white; padding: 3rem; border-radius: 10px;\
               box-shadow: 0 10px 40px rgba(0,0,0,0.2); text-align: center; }\
  h1 { color: #667eea; margin-bottom: 1rem; }\
  p { color: #666; margin-bottom: 1.5rem; }";

const FAILURE_STYLE: &str = "\
  body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;\
         display: flex; justify-content: center; align-items: center;\
         height: 100vh; margin: 0;\
         background: linear-gradient(135deg, #f093fb 0%, #f5576c 100%); }\
  .container { background: white; padding: 3rem; border-radius: 10px;\
               box-shadow: 0 10px 40px rgba(0,0,0,0.2); text-align: center;\
               max-width: 500px; }\
  h1 { color: #f5576c; margin-bottom: 1rem; }\
  p { color: #666; margin-bottom: 1rem; }\
  .error { color: #f5576c; font-family: monospace; background: #fee;\
           padding: 1rem; border-radius: 5px; }";

pub fn success_page() -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>TickTick CLI - Authorization Successful</title>\n\
         <style>{SUCCESS_STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n\
         <h1>Authorization Successful!</h1>\n\
         <p>You have successfully authorized the TickTick CLI.</p>\n\
         <p>You can now close this window and return to your terminal.</p>\n\
         </div>\n</body>\n</html>\n"
    )
}

pub fn failure_page(error: &str, description: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>TickTick CLI - Authorization Failed</title>\n\
         <style>{FAILURE_STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n\
         <h1>Authorization Failed</h1>\n\
         <p class=\"error\">{}: {}</p>\n\
         <p>Please close this window and try again in your terminal.</p>\n\
         </div>\n</body>\n</html>\n",
        escape(error),
        escape(description),
    )
}

/// The error code and description come back from the provider as query
/// parameters; escape them before echoing into HTML.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

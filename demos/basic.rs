/*!
Try setting the `RUST_LOG` environment variable to `debug` and run this example.
*/

use log_ctxt::{tag, Ctxt};

fn handle_request(ctxt: &Ctxt, user: &str) {
    let ctxt = log_ctxt::with(
        ctxt,
        &[tag("correlation", "Some Id"), tag("operation", "request")],
    );

    log_ctxt::info(&ctxt, "handling a request", &[tag("user", user)]);

    query_database(&log_ctxt::with(&ctxt, &[tag("operation", "database")]));
}

fn query_database(ctxt: &Ctxt) {
    log_ctxt::debug(ctxt, "doing database stuff", &[tag("rows", 3)]);
    log_ctxt::warn(ctxt, "the query was slow", &[]);
}

fn main() {
    log_ctxt::init();

    let ctxt = log_ctxt::with(&Ctxt::background(), &[tag("service", "basic.rs")]);

    log_ctxt::info(&ctxt, "starting up", &[]);

    handle_request(&ctxt, "Timmy");

    log_ctxt::info(&ctxt, "finishing up", &[]);
}

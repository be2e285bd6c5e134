use std::{process, sync::Arc, time::Duration};

use tidings::{
    application::{
        blog::BlogService,
        editor::EditorService,
        error::AppError,
        render::{
            DocumentRenderer, RenderPipelineConfig, extract_first_image, extract_plain_text,
            render_to_html,
        },
        repos::ContentRepo,
        session::SessionService,
        syndication::{FeedChannel, SyndicationService},
    },
    config,
    domain::document::Document,
    infra::{
        cms::CmsClient,
        error::InfraError,
        http::{self, AdminState, HttpState, RouterState, SessionCookie},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(&settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cms = CmsClient::new(&settings.cms).map_err(AppError::from)?;
    let content: Arc<dyn ContentRepo> = Arc::new(cms);
    let renderer = DocumentRenderer::new(RenderPipelineConfig::from(&settings.render));

    let router_state = build_router_state(content, renderer, &settings);
    serve_http(&settings, router_state).await
}

fn build_router_state(
    content: Arc<dyn ContentRepo>,
    renderer: DocumentRenderer,
    settings: &config::Settings,
) -> RouterState {
    let channel = FeedChannel {
        title: settings.site.title.clone(),
        description: settings.site.description.clone(),
        public_url: settings.site.public_url.clone(),
        limit: settings.site.feed_limit.get(),
    };

    let http = HttpState {
        blog: Arc::new(BlogService::new(
            content.clone(),
            renderer,
            settings.cms.page_size.get(),
        )),
        syndication: Arc::new(SyndicationService::new(content.clone(), renderer, channel)),
    };
    let admin = AdminState {
        session: Arc::new(SessionService::new(content.clone())),
        editor: Arc::new(EditorService::new(content)),
        cookie: SessionCookie::from(&settings.session),
    };

    RouterState { http, admin }
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "tidings::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());
    let deadline = shutdown_deadline(settings.server.graceful_shutdown);

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = deadline => {
            warn!(
                target = "tidings::serve",
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "tidings::serve", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "tidings::serve", "shutdown signal received");
}

/// Completes once the grace period has elapsed after a shutdown signal.
async fn shutdown_deadline(grace: Duration) {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

async fn run_render(settings: &config::Settings, args: config::RenderArgs) -> Result<(), AppError> {
    let input = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let document = Document::parse(&input);

    match args.format {
        config::RenderFormat::Html => println!("{}", render_to_html(&document)),
        config::RenderFormat::Text => {
            let limit = args
                .max_length
                .unwrap_or(settings.render.card_excerpt_chars);
            println!("{}", extract_plain_text(&document, limit));
        }
        config::RenderFormat::Image => match extract_first_image(&document) {
            Some(src) => println!("{src}"),
            None => {
                return Err(AppError::validation(format!(
                    "{} contains no image",
                    args.file.display()
                )));
            }
        },
    }

    Ok(())
}

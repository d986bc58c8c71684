use criterion::{black_box, criterion_group, criterion_main, Criterion};
use veer_router::Router;

fn github_like_router() -> Router<u32> {
    let mut router = Router::new();
    let routes = [
        "/",
        "/authorizations",
        "/authorizations/:id",
        "/repos/:owner/:repo",
        "/repos/:owner/:repo/issues",
        "/repos/:owner/:repo/issues/:number",
        "/repos/:owner/:repo/issues/:number/comments",
        "/repos/:owner/:repo/contents/*path",
        "/users/:user",
        "/users/:user/repos",
        "/user/starred/:owner/:repo",
        "/static/*filepath",
    ];
    for (id, route) in routes.iter().enumerate() {
        router.handle("GET", route, id as u32).unwrap();
    }
    router
}

fn benchmark_static_routes(c: &mut Criterion) {
    let router = github_like_router();

    c.bench_function("static_route_hit", |b| {
        b.iter(|| {
            let matched = router.lookup("GET", black_box("/authorizations"));
            black_box(matched);
        })
    });

    c.bench_function("static_route_miss", |b| {
        b.iter(|| {
            let matched = router.lookup("GET", black_box("/nonexistent"));
            black_box(matched);
        })
    });
}

fn benchmark_param_routes(c: &mut Criterion) {
    let router = github_like_router();

    c.bench_function("single_param", |b| {
        b.iter(|| {
            let matched = router.lookup("GET", black_box("/users/octocat"));
            black_box(matched);
        })
    });

    c.bench_function("nested_params", |b| {
        b.iter(|| {
            let matched = router.lookup(
                "GET",
                black_box("/repos/octocat/hello-world/issues/42/comments"),
            );
            black_box(matched);
        })
    });
}

fn benchmark_catch_all_routes(c: &mut Criterion) {
    let router = github_like_router();

    c.bench_function("catch_all", |b| {
        b.iter(|| {
            let matched = router.lookup("GET", black_box("/static/js/vendor/app.min.js"));
            black_box(matched);
        })
    });
}

fn benchmark_allowed(c: &mut Criterion) {
    let router = github_like_router();

    c.bench_function("allowed_concrete_path", |b| {
        b.iter(|| {
            let allow = router.allowed(black_box("/users/octocat"), "POST");
            black_box(allow);
        })
    });
}

criterion_group!(
    benches,
    benchmark_static_routes,
    benchmark_param_routes,
    benchmark_catch_all_routes,
    benchmark_allowed
);
criterion_main!(benches);

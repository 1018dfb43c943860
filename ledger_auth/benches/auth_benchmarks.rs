use argon2::Params;
use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use jsonwebtoken::Algorithm;
use ledger_auth::auth::{
    AuthManager, Claims, CredentialStore, NewIdentity, TokenCodec, TokenKind, TokenTtls,
};
use ledger_auth::db::MemoryIdentityStore;
use std::hint::black_box;

const SECRET: &[u8] = b"benchmark_secret_key_0123456789ab";

fn light_params() -> Params {
    Params::new(1024, 1, 1, None).unwrap()
}

/// Benchmark token signing for each supported algorithm
fn bench_token_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_encode");
    let claims = Claims::new(42, TokenKind::Access, Utc::now(), Duration::minutes(30)).unwrap();

    for algorithm in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
        let codec = TokenCodec::new(SECRET, algorithm).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{algorithm:?}")),
            &claims,
            |b, claims| b.iter(|| codec.encode(black_box(claims)).unwrap()),
        );
    }

    group.finish();
}

/// Benchmark token verification (runs on every protected request)
fn bench_token_decode(c: &mut Criterion) {
    let codec = TokenCodec::new(SECRET, Algorithm::HS256).unwrap();
    let claims = Claims::new(42, TokenKind::Access, Utc::now(), Duration::minutes(30)).unwrap();
    let token = codec.encode(&claims).unwrap();

    c.bench_function("token_decode", |b| {
        b.iter(|| codec.decode(black_box(&token)).unwrap())
    });
}

/// Benchmark password hashing with light Argon2 costs
fn bench_password_hash(c: &mut Criterion) {
    let credentials = CredentialStore::new(light_params());

    c.bench_function("password_hash", |b| {
        b.iter(|| credentials.hash_password(black_box("Passw0rd")).unwrap())
    });
}

/// Benchmark full identity resolution against the in-memory store
fn bench_resolve_identity(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let auth = AuthManager::new(
        TokenCodec::new(SECRET, Algorithm::HS256).unwrap(),
        CredentialStore::new(light_params()),
        TokenTtls::default(),
    );
    let store = MemoryIdentityStore::new();
    let identity = runtime
        .block_on(auth.register(
            &store,
            NewIdentity {
                email: "bench@x.com".to_string(),
                first_name: "Bench".to_string(),
                last_name: "User".to_string(),
                password: "Passw0rd".to_string(),
            },
        ))
        .unwrap();
    let token = auth.issue_access_token(identity.id).unwrap();

    c.bench_function("resolve_current_identity", |b| {
        b.iter(|| {
            runtime
                .block_on(
                    auth.gate()
                        .resolve_current_identity(&store, black_box(&token)),
                )
                .unwrap()
        })
    });
}

criterion_group!(tokens, bench_token_encode, bench_token_decode);

criterion_group!(credentials, bench_password_hash, bench_resolve_identity);

criterion_main!(tokens, credentials);

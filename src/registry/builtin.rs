//! Compile-time registration table of the emulated services.
//!
//! Patterns use the `regex` crate syntax, so none of them rely on
//! look-around. Overlapping URL spaces (apigatewayv2, neptune, opensearch,
//! the `_simple` variants) are resolved by the default exclusion set rather
//! than by rewriting the patterns.

/// Backends in enumeration order.
pub const BUILTIN_BACKENDS: &[&str] = &[
    "acm",
    "apigateway",
    "apigatewayv2",
    "awslambda",
    "awslambda_simple",
    "batch",
    "batch_simple",
    "cloudformation",
    "cloudwatch",
    "core",
    "dynamodb",
    "dynamodb_v20111205",
    "ec2",
    "emulator_api",
    "emulator_proxy",
    "emulator_server",
    "es",
    "events",
    "iam",
    "kinesis",
    "kms",
    "logs",
    "neptune",
    "opensearch",
    "packages",
    "rds",
    "s3",
    "s3bucket_path",
    "s3control",
    "secretsmanager",
    "ses",
    "sns",
    "sqs",
    "ssm",
    "sts",
    "utilities",
];

/// URL bases per backend. Infrastructure entries (`core`, `packages`, the
/// server and proxy) have none; the internal API is keyed by its qualified
/// name.
pub const BUILTIN_URL_BASES: &[(&str, &[&str])] = &[
    ("acm", &[r"https?://acm\.(.+)\.amazonaws\.com"]),
    ("apigateway", &[r"https?://apigateway\.(.+)\.amazonaws\.com"]),
    ("apigatewayv2", &[r"https?://apigateway\.(.+)\.amazonaws\.com"]),
    ("awslambda", &[r"https?://lambda\.(.+)\.amazonaws\.com"]),
    ("awslambda_simple", &[r"https?://lambda\.(.+)\.amazonaws\.com"]),
    ("batch", &[r"https?://batch\.(.+)\.amazonaws\.com"]),
    ("batch_simple", &[r"https?://batch\.(.+)\.amazonaws\.com"]),
    ("cloudformation", &[r"https?://cloudformation\.(.+)\.amazonaws\.com"]),
    ("cloudwatch", &[r"https?://monitoring\.(.+)\.amazonaws\.com"]),
    ("dynamodb", &[r"https?://dynamodb\.(.+)\.amazonaws\.com"]),
    ("dynamodb_v20111205", &[r"https?://dynamodb\.(.+)\.amazonaws\.com"]),
    ("ec2", &[r"https?://ec2\.(.+)\.amazonaws\.com(|\.cn)"]),
    ("emulator_api.internal", &[r"https?://emulatorapi\.amazonaws\.com"]),
    ("es", &[r"https?://es\.(.+)\.amazonaws\.com"]),
    ("events", &[r"https?://events\.(.+)\.amazonaws\.com"]),
    ("iam", &[r"https?://iam\.(.*\.)?amazonaws\.com"]),
    (
        "kinesis",
        &[
            r"https?://kinesis\.(.+)\.amazonaws\.com",
            r"https?://(.+)\.control-kinesis\.(.+)\.amazonaws\.com",
            r"https?://(.+)\.data-kinesis\.(.+)\.amazonaws\.com",
        ],
    ),
    ("kms", &[r"https?://kms\.(.+)\.amazonaws\.com"]),
    ("logs", &[r"https?://logs\.(.+)\.amazonaws\.com"]),
    (
        "neptune",
        &[r"https?://rds\.(.+)\.amazonaws\.com", r"https?://rds\.amazonaws\.com"],
    ),
    ("opensearch", &[r"https?://es\.(.+)\.amazonaws\.com"]),
    (
        "rds",
        &[r"https?://rds\.(.+)\.amazonaws\.com", r"https?://rds\.amazonaws\.com"],
    ),
    (
        "s3",
        &[
            r"https?://s3(\.[a-z0-9-]+)?\.amazonaws\.com",
            r"https?://([a-zA-Z0-9._-]+)\.s3(\.[a-z0-9-]+)?\.amazonaws\.com",
        ],
    ),
    ("s3bucket_path", &[r"https?://s3(.*)\.amazonaws\.com"]),
    ("s3control", &[r"https?://([0-9]+)\.s3-control\.(.+)\.amazonaws\.com"]),
    ("secretsmanager", &[r"https?://secretsmanager\.(.+)\.amazonaws\.com"]),
    (
        "ses",
        &[r"https?://email\.(.+)\.amazonaws\.com", r"https?://ses\.(.+)\.amazonaws\.com"],
    ),
    ("sns", &[r"https?://sns\.(.+)\.amazonaws\.com"]),
    ("sqs", &[r"https?://(.*\.)?(queue|sqs)\.(.*\.)?amazonaws\.com"]),
    ("ssm", &[r"https?://ssm\.(.+)\.amazonaws\.com"]),
    ("sts", &[r"https?://sts\.(.*\.)?amazonaws\.com"]),
];

/// Backends that never enter the index.
///
/// - server, proxy, core, packages, utilities: infrastructure, not services
/// - apigatewayv2: its URLs are served by apigateway
/// - `_simple` variants and dynamodb_v20111205: alternative implementations
/// - s3bucket_path: covered by s3
/// - neptune: shares its URL with rds
/// - opensearch: shares its URL with es
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "emulator_server",
    "emulator_proxy",
    "apigatewayv2",
    "awslambda_simple",
    "batch_simple",
    "core",
    "dynamodb_v20111205",
    "packages",
    "utilities",
    "s3bucket_path",
    "neptune",
    "opensearch",
];

/// Special-case renames applied before lookup.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[("emulator_api", "emulator_api.internal")];

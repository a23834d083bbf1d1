use taskwire_codec::{build, SerializerRegistry};
use taskwire_server::{ServerConfig, TaskListener};

use crate::cmd::ServeArgs;
use crate::exit::{codec_error, server_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let registry = SerializerRegistry::default();
    let serializer = build(&registry, &args.serializer)
        .map_err(|err| codec_error("invalid --serializer", err))?;

    let config = ServerConfig::default()
        .with_acceptors(args.acceptors)
        .with_pool_size(args.pool_size)
        .with_queue_depth(args.queue_depth)
        .with_serializer(serializer);

    // The port handshake goes to stdout; everything else logs to stderr.
    TaskListener::serve(args.address.as_str(), config, std::io::stdout().lock())
        .map_err(|err| server_error("serve failed", err))?;

    Ok(SUCCESS)
}

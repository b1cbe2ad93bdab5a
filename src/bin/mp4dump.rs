use anyhow::{Context, bail};
use avcbox::{
    BoxNode, BoxValue, Children, FourCC, Mp4Tree, ParseOptions,
    json_api::{box_to_json, to_json_string},
    known_boxes::KnownBox,
    parse_with,
    util::hex_dump,
};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "MP4/ISOBMFF box tree explorer with H.264 NAL listing")]
struct Args {
    /// MP4/ISOBMFF file path
    path: String,

    /// Only print the subtree at a box path (e.g. moov/trak:0/mdia/minf/stbl)
    #[arg(long = "filter")]
    filter: Option<String>,

    /// Hex-dump the body of every box of this 4CC (e.g. --raw avcC)
    #[arg(long = "raw")]
    raw: Option<String>,

    /// Limit recursion depth (for text/tree output)
    #[arg(long, default_value_t = 64)]
    max_depth: usize,

    /// Print decoded field summaries under each box
    #[arg(long, action = ArgAction::SetTrue)]
    decode: bool,

    /// Show bytes count when dumping raw (0 means entire box body)
    #[arg(long, default_value_t = 0)]
    bytes: usize,

    /// Emit JSON instead of human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Print the box visit trace (BoxPath, BoxHead, BoxType, BoxSize)
    #[arg(long, action = ArgAction::SetTrue)]
    diagnostics: bool,

    /// List the NAL units of the top-level mdat
    #[arg(long, action = ArgAction::SetTrue)]
    nal: bool,

    /// Hex-dump every NAL unit of the top-level mdat
    #[arg(long, action = ArgAction::SetTrue)]
    dump: bool,

    /// Do not warn about unexpected reserved / pre_defined values
    #[arg(long, action = ArgAction::SetTrue)]
    no_verify: bool,

    /// Trace every visited box with a hex dump (implies RUST_LOG=trace)
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let data = std::fs::read(&args.path).with_context(|| format!("reading {}", args.path))?;
    let options = ParseOptions::default()
        .with_diagnostics(args.diagnostics)
        .with_verbose(args.verbose)
        .with_verify(!args.no_verify);
    let tree = parse_with(&data, 0, &options).with_context(|| format!("parsing {}", args.path))?;

    // JSON mode: output JSON and exit (no tree or raw to keep output clean)
    if args.json {
        let out = match &args.filter {
            Some(path) => serde_json::to_string_pretty(&box_to_json(select(&tree, path)?)?)?,
            None => to_json_string(&tree, true)?,
        };
        println!("{}", out);
        return Ok(());
    }

    // Text tree
    match &args.filter {
        Some(path) => print_box(select(&tree, path)?, 0, args.max_depth, args.decode),
        None => {
            println!(
                "{:>8} {:>10} {}",
                format!("{:#x}", tree.head),
                tree.size,
                tree.typ
            );
            print_children(&tree.root, 1, args.max_depth, args.decode);
        }
    }

    if let Some(diag) = &tree.diagnostics {
        println!("\n== Diagnostics ({} boxes) ==", diag.len());
        for entry in diag.iter() {
            println!(
                "{:>8} {:>10} {}  {}",
                format!("{:#x}", entry.box_head),
                entry.box_size,
                entry.box_type,
                entry.box_path
            );
        }
    }

    if let Some(sel) = args.raw.as_ref() {
        dump_raw(&data, &tree, sel, args.bytes)?;
    }

    if args.nal || args.dump {
        let Some(BoxValue::Mdat(mdat)) = tree.top("mdat").map(|b| &b.value) else {
            bail!("{} has no top-level mdat box", args.path);
        };
        if args.nal {
            println!("\n== NAL units ==");
            for (i, unit) in mdat.nal_units().verbose(args.verbose).enumerate() {
                let unit = unit?;
                println!(
                    "#{:<5} {:>10} {:>8}  type={:<2} ref_idc={} {}",
                    i,
                    format!("{:#x}", unit.offset),
                    unit.data.len(),
                    unit.unit_type(),
                    unit.nal_ref_idc(),
                    unit.type_name()
                );
            }
        }
        if args.dump {
            println!("\n== NAL dump ==");
            print!("{}", mdat.dump()?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    // Respect RUST_LOG if set, otherwise warnings only (or everything with --verbose)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "trace" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn select<'t, 'a>(tree: &'t Mp4Tree<'a>, path: &str) -> anyhow::Result<&'t BoxNode<'a>> {
    tree.get(path)
        .with_context(|| format!("no box at path {}", path))
}

// ---------- Human-readable tree ----------

fn print_children(children: &Children<'_>, depth: usize, max_depth: usize, decode: bool) {
    if depth > max_depth {
        return;
    }
    for (_, node) in children.iter() {
        for b in node.as_slice() {
            print_box(b, depth, max_depth, decode);
        }
    }
}

fn print_box(b: &BoxNode<'_>, depth: usize, max_depth: usize, decode: bool) {
    let indent = "  ".repeat(depth);
    let hdr = &b.header;
    let kind = KnownBox::from(hdr.typ);
    let suffix = if kind.has_children() { " (container)" } else { "" };

    println!(
        "{indent}{:>8} {:>10} {} [{}]{}",
        format!("{:#x}", hdr.head),
        hdr.size,
        hdr.typ,
        kind.full_name(),
        suffix
    );
    if decode {
        let summary = b.value.to_string();
        if !summary.is_empty() {
            println!("{indent}        -> {}", summary);
        }
    }

    print_children(&b.children, depth + 1, max_depth, decode);
}

// ---------- Raw dump ----------

fn dump_raw(data: &[u8], tree: &Mp4Tree<'_>, sel: &str, limit: usize) -> anyhow::Result<()> {
    let typ = FourCC::from_str(sel).with_context(|| format!("--raw expects a 4CC, got {:?}", sel))?;

    let mut matches = Vec::new();
    select_boxes(&tree.root, typ, &mut matches);

    for (i, b) in matches.into_iter().enumerate() {
        let (start, end) = b.header.body_range();
        let len = end - start;
        let to_read = if limit == 0 || limit as u64 > len {
            len
        } else {
            limit as u64
        };
        let bytes = &data[start as usize..(start + to_read) as usize];
        println!(
            "\n== Dump {} ({}) body: offset={:#x}, len={} ==",
            i, b.header.typ, start, to_read
        );
        print!("{}", hex_dump(bytes, start));
    }
    Ok(())
}

fn select_boxes<'t, 'a>(children: &'t Children<'a>, typ: FourCC, out: &mut Vec<&'t BoxNode<'a>>) {
    for (_, node) in children.iter() {
        for b in node.as_slice() {
            if b.typ() == typ {
                out.push(b);
            }
            select_boxes(&b.children, typ, out);
        }
    }
}

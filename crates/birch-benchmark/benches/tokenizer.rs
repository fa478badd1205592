use codspeed_criterion_compat::{
    Criterion, Throughput, black_box, criterion_group, criterion_main,
};

static SOURCE: &str = "
def spam(eggs, *args, **kwargs):
    if eggs >= 0x1f and not args:
        return [x ** 2 for x in range(eggs) if x % 3 != 0]
    elif kwargs:
        eggs <<= 1; eggs //= 2
    else:
        raise ValueError('bad eggs: %r' % (eggs,))

class Ham(object):
    '''A triple-quoted
    docstring.'''
    def __init__(self, value=1.5e-3):
        self.value = value  # trailing comment
";

static IDENTIFIERS: &str =
    "It was the year when they finally immanentized the Eschaton It was the year when they \
     finally immanentized the Eschaton It was the year when they finally immanentized the \
     Eschaton It was the year when they finally immanentized the Eschaton It was the year when \
     they finally immanentized the Eschaton It was the year when they finally immanentized the \
     Eschaton It was the year when they finally immanentized the Eschaton";

static CANDIDATES: [(&str, &str); 2] =
    [("identifiers", IDENTIFIERS), ("statements_and_operators", SOURCE)];

fn iterate(s: &str) {
    use birch_syntax::Symbol;
    use birch_tokenizer::Tokenizer;

    let mut tokenizer = Tokenizer::new(s);

    loop {
        let Ok(token) = tokenizer.next_token() else { break };
        if token.symbol == Symbol::ENDMARKER {
            break;
        }

        black_box(token);
    }
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for (name, source) in CANDIDATES {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(name, &source, |b, &s| b.iter(|| iterate(s)));
    }
}

criterion_group!(benches, bench_iterate);
criterion_main!(benches);

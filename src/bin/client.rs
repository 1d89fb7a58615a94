use std::io::{self, BufRead, Read, Write};

use kvtable::{
    ServerConfig,
    protocol::{ParseError, encode_request, parse_response},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ServerConfig::from_env()?.addr()?;
    let mut sock = std::net::TcpStream::connect(addr)?;

    let mut rbuf = String::with_capacity(1024);
    let mut wbuf = Vec::with_capacity(1024);
    let mut resp = Vec::new();
    let mut chunk = vec![0; 1024];
    let stdin = io::stdin();

    loop {
        print!("[you] ");
        io::stdout().flush()?;

        rbuf.clear();
        let nread = stdin
            .lock()
            .read_line(&mut rbuf)
            .inspect_err(|e| eprintln!("error on stdin read {e}"))?;
        if 0 == nread {
            eprintln!("stdin: EOF");
            return Ok(());
        }

        let args: Vec<&str> = rbuf.split_whitespace().collect();
        if args.is_empty() {
            continue;
        }

        wbuf.clear();
        encode_request(args.as_slice(), &mut wbuf);
        sock.write_all(&wbuf)
            .inspect_err(|e| eprintln!("error on socket write {e}"))?;

        let (status, payload, used) = loop {
            match parse_response(&resp) {
                Ok((status, payload, used)) => break (status, payload.to_vec(), used),
                Err(ParseError::NotEnoughBytes { .. }) => {
                    let n = sock
                        .read(&mut chunk)
                        .inspect_err(|e| eprintln!("error on socket read {e}"))?;
                    if 0 == n {
                        eprintln!("sock read: EOF");
                        return Ok(());
                    }
                    resp.extend_from_slice(&chunk[..n]);
                }
                Err(e) => return Err(e.into()),
            }
        };
        resp.drain(..used);

        println!("[srv] {} {}", status, String::from_utf8_lossy(&payload));
    }
}
